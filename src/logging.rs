use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// Logs go to stderr so stdout carries only extracted text. `RUST_LOG`
/// overrides the default level.
pub fn init_logging(json: bool, verbose: bool) {
    let default_level = if verbose {
        "img2text=debug,img2text_lib=debug"
    } else {
        "img2text=info,img2text_lib=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // try_init: a second call (tests, embedding) keeps the first subscriber
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
}
