fn main() {
    stackctl::run_cli();
}
