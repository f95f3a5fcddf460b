use gdbcheck_core::registry_json_schema;

fn main() {
    let schema = registry_json_schema().expect("build registry json schema");
    let json = serde_json::to_string_pretty(&schema).expect("serialize json schema");
    println!("{json}");
}
