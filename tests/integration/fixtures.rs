//! Shared test fixtures

use bundlepack::config::Config;
use std::path::Path;

pub const STACK: &str = "io.buildpacks.stacks.bionic";
pub const OTHER_STACK: &str = "io.paketo.stacks.tiny";

pub const DESCRIPTOR: &str = r#"
api = "0.7"

[buildpack]
id = "paketo-community/bundler"
name = "Bundler Buildpack"
version = "1.2.3"

[metadata.default-versions]
bundler = "*"

[[metadata.dependencies]]
id = "bundler"
version = "1.17.3"
uri = "https://example.test/bundler-1.17.3.gem"
stacks = ["io.buildpacks.stacks.bionic", "io.paketo.stacks.tiny"]

[[metadata.dependencies]]
id = "bundler"
version = "2.0.2"
uri = "https://example.test/bundler-2.0.2.gem"
stacks = ["io.buildpacks.stacks.bionic", "io.paketo.stacks.tiny"]

[[metadata.dependencies]]
id = "bundler"
version = "2.1.4"
uri = "https://example.test/bundler-2.1.4.gem"
stacks = ["io.buildpacks.stacks.bionic", "io.paketo.stacks.tiny"]

[[metadata.dependencies]]
id = "bundler"
version = "2.2.0"
uri = "https://example.test/bundler-2.2.0.gem"
stacks = ["org.example.stacks.other"]
"#;

pub fn config() -> Config {
    toml::from_str(DESCRIPTOR).unwrap()
}

pub fn lock_file(bundled_with: &str) -> String {
    format!(
        "GEM\n  remote: https://rubygems.org/\n  specs:\n    rack (2.2.3)\n\n\
         PLATFORMS\n  ruby\n\n\
         DEPENDENCIES\n  rack\n\n\
         BUNDLED WITH\n   {}\n",
        bundled_with
    )
}

pub fn write_lock_file(app_dir: &Path, bundled_with: &str) {
    std::fs::create_dir_all(app_dir).unwrap();
    std::fs::write(app_dir.join("Gemfile.lock"), lock_file(bundled_with)).unwrap();
}

pub fn write_descriptor(buildpack_dir: &Path) {
    std::fs::create_dir_all(buildpack_dir).unwrap();
    std::fs::write(buildpack_dir.join("buildpack.toml"), DESCRIPTOR).unwrap();
}
