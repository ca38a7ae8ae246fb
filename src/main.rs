use std::process::exit;

fn main() {
    if let Err(e) = pi_lead_monitor::app::run_cli() {
        eprintln!("error: {e}");
        exit(1);
    }
}
