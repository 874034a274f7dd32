use colored::*;

pub fn print_version_info() {
    println!(
        "{} {}",
        "acc".green().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("  {}", env!("CARGO_PKG_DESCRIPTION").dimmed());
    println!("  board protocol: Firmata 2.x (FirmataExpress for the HC-SR04)");
}
