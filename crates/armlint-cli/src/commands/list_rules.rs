//! List rules command implementation.

use armlint_rules::{all_rules, Preset};

/// Runs the list-rules command.
pub fn run() {
    println!("Available rules:\n");
    println!(
        "{:<7} {:<36} {:<11} {:<8} Description",
        "Code", "Name", "Scope", "Severity"
    );
    println!("{}", "-".repeat(100));

    for rule in all_rules() {
        println!(
            "{:<7} {:<36} {:<11} {:<8} {}",
            rule.code(),
            rule.name(),
            rule.merge_state().to_string(),
            rule.default_severity().to_string(),
            rule.description()
        );
    }

    println!("\nPresets:");
    for preset in [Preset::Arm, Preset::Dataplane, Preset::All] {
        let codes: Vec<&str> = preset.rules().iter().map(|r| r.code()).collect();
        println!("  {:<10} - {}", preset.as_str(), codes.join(", "));
    }

    println!("\nUse --rules to filter specific rules, e.g.:");
    println!("  armlint check --rules operation-id-noun-verb,collection-next-link");
    println!("  armlint check --rules R4001,R4002");
}
