use anyhow::{Result, anyhow};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

pub fn setup_tracing(log_level: &str, log_fmt: &str, log_no_color: bool) -> Result<()> {
    let filter_layer = EnvFilter::builder().parse(log_level)?;
    // some of our dependencies generate trace events too, but we don't care about them ->
    // let's filter them
    let filter_layer = ["h2=off", "hyper=off", "rustls=off", "tower=off"]
        .into_iter()
        .try_fold(filter_layer, |filter, directive| {
            Ok::<_, anyhow::Error>(filter.add_directive(directive.parse()?))
        })?;

    match log_fmt {
        "json" => tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt::layer().json())
            .try_init()?,
        "text" => {
            let fmt_layer = fmt::layer().with_ansi(!log_no_color);

            tracing_subscriber::registry()
                .with(filter_layer)
                .with(fmt_layer)
                .try_init()?
        }
        _ => return Err(anyhow!("Unknown log message format")),
    };

    Ok(())
}
