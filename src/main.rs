fn main() -> Result<(), Box<dyn std::error::Error>> {
    kindred::cli::main()
}
