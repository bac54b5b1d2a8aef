//! Demonstrates the core lifecycle: create_project, add_file,
//! save_checkpoint, restore_version.

use jcf::adapter::MemoryAdapter;
use jcf::Project;

fn main() -> jcf::Result<()> {
    tracing_subscriber_init();

    println!("{}", "=".repeat(50));
    println!("Example: Basic Workflow");
    println!("{}", "=".repeat(50));

    let mut project = Project::new(MemoryAdapter::new());

    println!("\n[1] Creating project 'DemoApp'...");
    project.create_project("DemoApp", now())?;

    println!("[2] Adding 'README.md'...");
    project.add_file(
        "README.md",
        b"# Demo Project\nInitial content.".to_vec(),
        now(),
    )?;

    let v1 = project.save_checkpoint("Initial commit", "demo", now())?;
    println!(" -> Checkpoint saved: {}", &v1[..12.min(v1.len())]);

    println!("\n[3] Modifying 'README.md'...");
    project.add_file(
        "README.md",
        b"# Demo Project\nUpdated content with new features.".to_vec(),
        now(),
    )?;

    let v2 = project.save_checkpoint("Update README", "demo", now())?;
    println!(" -> Checkpoint saved: {}", &v2[..12.min(v2.len())]);

    let current = project.get_file("README.md")?.expect("just staged");
    println!(
        "    Current content: {}",
        String::from_utf8_lossy(current).trim()
    );
    assert!(String::from_utf8_lossy(current).contains("Updated content"));

    println!("\n[4] Restoring version {}...", &v1[..12.min(v1.len())]);
    let restored_id = project.restore_version(&v1)?;
    println!(" -> Restored to: {}", &restored_id[..12.min(restored_id.len())]);

    let restored = project.get_file("README.md")?.expect("restored");
    println!(
        "    Restored content: {}",
        String::from_utf8_lossy(restored).trim()
    );

    if String::from_utf8_lossy(restored).contains("Initial content") {
        println!("\n    SUCCESS: Content restored correctly!");
    } else {
        println!("\n    FAILURE: Content mismatch!");
    }

    Ok(())
}

fn now() -> &'static str {
    "2024-01-01T00:00:00Z"
}

fn tracing_subscriber_init() {
    // Demo programs just print; the engine itself logs through `tracing`
    // but wiring a subscriber is left to the host application.
}
