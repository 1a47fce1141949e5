use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    resilia::cli::main()
}
