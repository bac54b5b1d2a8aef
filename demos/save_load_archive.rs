//! Demonstrates packaging a project into a portable archive and
//! reconstituting it against a completely fresh adapter — no out-of-band
//! copy of the blob directory required.

use jcf::adapter::{MemoryAdapter, StorageAdapter};
use jcf::Project;

fn main() -> jcf::Result<()> {
    println!("{}", "=".repeat(50));
    println!("Example: Save & Load Archive");
    println!("{}", "=".repeat(50));

    let mut project = Project::new(MemoryAdapter::new());
    project.create_project("ArchiveDemo", now())?;

    project.add_file("index.html", b"<html>v1</html>".to_vec(), now())?;
    let v1 = project.save_checkpoint("Version 1", "demo", now())?;

    project.add_file("index.html", b"<html>v2 - updated</html>".to_vec(), now())?;
    project.add_file("style.css", b"body { color: blue; }".to_vec(), now())?;
    let v2 = project.save_checkpoint("Version 2", "demo", now())?;

    println!("\n[1] Created project with 2 versions");
    println!("    v1: {}...", &v1[..12.min(v1.len())]);
    println!("    v2: {}...", &v2[..12.min(v2.len())]);

    println!("\n[2] save_archive(\"project.jcf\")");
    project.save_archive("project.jcf")?;
    let archive_bytes = project.adapter().read("project.jcf")?;
    println!("    Size: {} bytes", archive_bytes.len());

    println!("\n[3] load_archive() into a brand-new adapter");
    let mut fresh_adapter = MemoryAdapter::new();
    fresh_adapter.write("project.jcf", &archive_bytes)?;
    let mut loaded = Project::new(fresh_adapter);
    loaded.load_archive("project.jcf")?;
    println!("    No separate copy of .store/ was needed.");

    println!("\n[4] get_file_at_version(\"index.html\", v1)");
    let old_content = loaded
        .get_file_at_version("index.html", &v1)?
        .expect("v1 recorded index.html");
    println!("    Content at v1: {}", String::from_utf8_lossy(&old_content));
    assert!(String::from_utf8_lossy(&old_content).contains("v1"));

    let current = loaded.get_file("index.html")?.expect("staged after load");
    println!("    Current content: {}", String::from_utf8_lossy(current));
    assert!(String::from_utf8_lossy(current).contains("v2"));

    let report = loaded.verify_integrity()?;
    println!("\n[5] verify_integrity(): valid = {}", report.valid);

    println!("\n    SUCCESS!");
    Ok(())
}

fn now() -> &'static str {
    "2024-01-01T00:00:00Z"
}
