// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod driver;
pub mod error;
pub mod forms;
pub mod ids;
pub mod menu;
pub mod model;
pub mod price;
pub mod state;

pub use driver::*;
pub use error::*;
pub use forms::*;
pub use ids::*;
pub use menu::*;
pub use model::*;
pub use price::*;
pub use state::*;
