use std::process::exit;

use omarlens::status::Status;

fn main() {
    if let Err(e) = omarlens::app::run_cli() {
        eprintln!("{}", Status::error(e));
        exit(1);
    }
}
