fn main() {
    #[cfg(feature = "cli")]
    narcrs::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("narc: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
