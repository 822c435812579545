fn main() {
    review_stats::cli::run();
}
