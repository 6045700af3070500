//! User-facing failure output

use pulse_common::errors::{ApiError, AppError, AuthError};

/// Print a failure to stderr; remote rejections show status and raw body
pub fn failure(err: &anyhow::Error) {
    tracing::error!(error = %err, "Command failed");
    eprintln!("{}", render(err));
}

fn render(err: &anyhow::Error) -> String {
    if let Some(app) = err.downcast_ref::<AppError>() {
        return render_app(app);
    }
    if let Some(auth) = err.downcast_ref::<AuthError>() {
        return render_app(&AppError::Auth(auth.clone()));
    }
    format!("Error: {:#}", err)
}

fn render_app(err: &AppError) -> String {
    match err {
        AppError::Api(ApiError::Remote { status, body }) => {
            format!("Request failed with status {}\n{}", status, body)
        }
        other => format!("Error [{}]: {}", other.code().as_code(), other),
    }
}
