use super::AnnError;

pub type Result<T> = std::result::Result<T, AnnError>;

pub fn handle_error_and_exit(err: AnnError) -> ! {
    log::error!("{}", err);
    std::process::exit(1);
}
