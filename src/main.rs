fn main() {
    tonicpow::cli::run();
}
