use proc_macro::TokenStream;
use proc_macro2::Ident;
use std::env;
use std::path::PathBuf;

fn expansion_dir(kind: &str) -> Option<PathBuf> {
    match env::current_dir() {
        Ok(dir) => Some(dir.join("target").join("macros").join(kind)),
        Err(e) => {
            eprintln!("Current dir inaccessible: {}", e);
            None
        }
    }
}

/// Best effort, a failed dump never fails the expansion.
pub fn dump_expansion(source: &str, kind: &str, file_name: &str) {
    let Some(dir) = expansion_dir(kind) else { return };
    if let Err(e) = std::fs::create_dir_all(&dir) {
        eprintln!("Failed to create directory {:?}: {}", dir, e);
        return;
    }
    let path = dir.join(file_name);
    if let Err(e) = std::fs::write(&path, source) {
        eprintln!("Failed to write to {:?}: {}", path, e);
    }
}

/// Dumps the pretty-printed expansion of `record` under `target/macros/<kind>/` and hands the stream to the compiler.
pub fn submit_record_stream(stream: proc_macro2::TokenStream, kind: &str, record: &Ident, suffix: &str) -> TokenStream {
    let pretty = match syn::parse2::<syn::File>(stream.clone()) {
        Ok(file) => prettyplease::unparse(&file),
        Err(_) => stream.to_string(),
    };
    dump_expansion(&pretty, kind, &format!("{record}{suffix}"));
    stream.into()
}
