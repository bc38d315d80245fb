// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod filter;
pub mod history;
pub mod ids;
pub mod model;
pub mod notify;
pub mod panel;
pub mod state;
pub mod tabs;
pub mod view;

pub use filter::*;
pub use history::*;
pub use ids::*;
pub use model::*;
pub use notify::*;
pub use panel::*;
pub use state::*;
pub use tabs::*;
pub use view::*;
