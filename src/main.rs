fn main() {
    templet::cli::run();
}
