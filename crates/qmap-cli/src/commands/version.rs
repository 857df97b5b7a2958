//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - routing compiler for quantum circuits",
        style("qmap").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qmap-ir       Circuit intermediate representation");
    println!("  qmap-compile  Layout, routing and rewrite passes");
    println!("  qmap-qasm     OpenQASM 2.0 emitter");
    println!("  qmap-cli      Command-line interface");
    println!();
    println!("License: {}", style(env!("CARGO_PKG_LICENSE")).dim());
}
