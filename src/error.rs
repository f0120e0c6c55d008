use thiserror::Error;

#[derive(Error, Debug)]
pub enum FadeError {
    #[error("Ошибка i3-ipc: {0}")]
    Ipc(#[from] swayipc_async::Error),

    #[error("Сервис недоступен: {0}")]
    ServiceUnavailable(String),
}

pub type Result<T> = std::result::Result<T, FadeError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! fade_error {
    (service_unavailable, $($arg:tt)*) => {
        $crate::error::FadeError::ServiceUnavailable(format!($($arg)*))
    };
}
