use crate::{
    application::{
        connection::manager::ConnectionManager, dispatch_tryon::use_case::DispatchTryOnUseCase,
    },
    config::Config,
    infrastructure::imaging::placeholder::ErrorRenderer,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub connections: Arc<ConnectionManager>,
    pub dispatcher: Arc<DispatchTryOnUseCase>,
    pub renderer: Arc<ErrorRenderer>,
}
