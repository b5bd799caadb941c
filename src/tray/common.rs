use crate::APP_NAME;

pub fn about_title() -> String {
    format!("About {APP_NAME}")
}

/// Message and detail lines for the about box.
pub fn about_text() -> (String, String) {
    let message = format!("{APP_NAME}\tver:  {}", env!("CARGO_PKG_VERSION"));
    let detail = format!(
        "Runs your shell commands from a tray menu.\n\nLicense:  {}",
        env!("CARGO_PKG_LICENSE")
    );
    (message, detail)
}
