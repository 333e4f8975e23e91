mod health;
mod metrics;
mod pastes;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use pastes::{
    create_paste_handler, delete_paste_handler, edit_paste_handler, list_pastes_handler,
    view_paste_handler,
};
