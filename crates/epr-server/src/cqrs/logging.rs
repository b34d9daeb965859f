use std::future::Future;

use crate::error::AppResult;

pub async fn around<Res, Fut>(name: &'static str, fut: Fut) -> AppResult<Res>
where
    Fut: Future<Output = AppResult<Res>>,
{
    tracing::info!(request = name, "Handling {name}");
    let result = fut.await;
    match &result {
        Ok(_) => tracing::info!(request = name, "Handled {name}"),
        Err(error) => tracing::info!(request = name, error = %error, "Handled {name} with error"),
    }
    result
}
