//! Wickr Core
//!
//! Resource graph, parameters and template synthesis shared by the Wickr
//! Enterprise infrastructure declaration

pub mod case_convert;
pub mod differ;
pub mod effect;
pub mod graph;
pub mod parameter;
pub mod plan;
pub mod resource;
pub mod schema;
pub mod schemas;
pub mod template;
