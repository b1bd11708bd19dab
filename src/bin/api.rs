use intake::api::{ApiState, handler};

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    intake::setup_logging();
    let state = ApiState::from_env()?;
    let state = &state;
    lambda_runtime::run(lambda_runtime::service_fn(move |event| async move {
        handler(state, event).await
    }))
    .await
}
