use entities::ENTITIES;
use std::collections::BTreeMap;
use std::io::Write;
use std::{env, path::PathBuf};

fn main() {
    let out_dir: PathBuf = env::var("OUT_DIR").unwrap().parse().unwrap();

    // entity::lookup is handed just the inner entity name, like "amp" for
    // "&amp;"; we only match those with a trailing ";".
    //
    // entities::ENTITIES includes many both with and without a trailing ";".
    // Exclude those without, then key the map on the bare name.
    let translated_entities = ENTITIES
        .iter()
        .filter(|e| e.entity.starts_with('&') && e.entity.ends_with(';'))
        .map(|e| (&e.entity[1..e.entity.len() - 1], e.characters))
        .collect::<BTreeMap<_, _>>();

    let mut map = phf_codegen::Map::new();
    for (entity, characters) in &translated_entities {
        map.entry(*entity, &format!("{:?}", characters));
    }

    let out = std::fs::File::create(out_dir.join("entitydata.rs")).unwrap();
    let mut bw = std::io::BufWriter::new(out);
    writeln!(bw, "mod entitydata {{").unwrap();
    writeln!(
        bw,
        "    pub static MAX_LENGTH: usize = {};",
        translated_entities.keys().map(|e| e.len()).max().unwrap_or(0) + 1
    )
    .unwrap();
    writeln!(
        bw,
        "    pub static TRANSLATED_ENTITIES: phf::Map<&'static str, &'static str> = {};",
        map.build()
    )
    .unwrap();
    writeln!(bw, "}}").unwrap();
}
