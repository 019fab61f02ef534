fn main() {
    if let Err(error) = xmlview_cli::run() {
        // Load failures were already printed by the console error view.
        if error.downcast_ref::<xmlview_runtime::LoadError>().is_none() {
            // Tracing is initialized inside run() after argument parsing.
            tracing::error!(%error, "xmlview failed");
        }
        std::process::exit(1);
    }
}
