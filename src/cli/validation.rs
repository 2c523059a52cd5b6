use std::net::SocketAddr;

use crate::cli::args::{FetchArgs, RenderArgs, ServeArgs};
use crate::output::OutputFormat;
use crate::view::ViewMode;

pub fn validate_render(args: &RenderArgs) -> Result<(), String> {
    if let Some(raw) = args.output_format.as_deref() {
        if OutputFormat::parse(raw).is_none() {
            return Err(format!(
                "invalid --output-format '{raw}', expected json, html or csv"
            ));
        }
    }
    if let Some(raw) = args.view.as_deref() {
        if ViewMode::parse(raw).is_none() {
            return Err(format!("invalid --view '{raw}', expected json or list"));
        }
    }
    Ok(())
}

pub fn validate_fetch(args: &FetchArgs) -> Result<(), String> {
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.relay.as_deref() {
        reqwest::Url::parse(raw).map_err(|e| format!("invalid --relay '{raw}': {e}"))?;
    }
    if let Some(raw) = args.api_base.as_deref() {
        reqwest::Url::parse(raw).map_err(|e| format!("invalid --api-base '{raw}': {e}"))?;
    }
    validate_render(&args.render)
}

pub fn validate_serve(args: &ServeArgs) -> Result<(), String> {
    if let Some(raw) = args.bind.as_deref() {
        raw.parse::<SocketAddr>()
            .map_err(|e| format!("invalid --bind '{raw}': {e}"))?;
    }
    if let Some(raw) = args.upstream.as_deref() {
        reqwest::Url::parse(raw).map_err(|e| format!("invalid --upstream '{raw}': {e}"))?;
    }
    Ok(())
}
