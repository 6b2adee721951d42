//! Display names for hero and enemy identifiers
//!
//! Built once per pipeline run from the optional game data directory
//! (`heroes.json`, `enemies.json`) on top of a built-in hero table. Missing or
//! broken reference files never fail the pipeline; lookups fall back to the
//! identifier itself.

use super::counter::FrequencyCounter;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const BUILTIN_HEROES: [(&str, &str); 7] = [
    ("wanderer", "Рыцарь"),
    ("rune_guard", "Страж рун"),
    ("berserk", "Берсерк"),
    ("assassin", "Ассасин"),
    ("hunter", "Охотник"),
    ("executioner", "Палач"),
    ("duelist", "Дуэлянт"),
];

pub const HEROES_FILE: &str = "heroes.json";
pub const ENEMIES_FILE: &str = "enemies.json";

#[derive(Debug, Clone)]
pub struct NameResolver {
    heroes: HashMap<String, String>,
    enemies: HashMap<String, String>,
}

impl Default for NameResolver {
    fn default() -> Self {
        Self::builtin()
    }
}

impl NameResolver {
    /// Built-in hero names only, no enemy names
    pub fn builtin() -> Self {
        let heroes = BUILTIN_HEROES
            .iter()
            .map(|(id, name)| (id.to_string(), name.to_string()))
            .collect();
        Self {
            heroes,
            enemies: HashMap::new(),
        }
    }

    /// Built-in names augmented with the reference files in `data_dir`
    pub fn load(data_dir: Option<&Path>) -> Self {
        let mut resolver = Self::builtin();
        let Some(dir) = data_dir else {
            return resolver;
        };

        resolver.enemies.extend(load_reference(&dir.join(ENEMIES_FILE)));
        resolver.heroes.extend(load_reference(&dir.join(HEROES_FILE)));

        log::info!(
            "📖 Name tables: {} heroes, {} enemies (from {})",
            resolver.heroes.len(),
            resolver.enemies.len(),
            dir.display()
        );
        resolver
    }

    pub fn with_hero(mut self, id: &str, name: &str) -> Self {
        self.heroes.insert(id.to_string(), name.to_string());
        self
    }

    pub fn with_enemy(mut self, id: &str, name: &str) -> Self {
        self.enemies.insert(id.to_string(), name.to_string());
        self
    }

    pub fn hero_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.heroes.get(id).map_or(id, String::as_str)
    }

    pub fn enemy_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.enemies.get(id).map_or(id, String::as_str)
    }

    pub fn remap_heroes(&self, counter: &FrequencyCounter) -> FrequencyCounter {
        counter.remap(|id| self.hero_name(id))
    }

    pub fn remap_enemies(&self, counter: &FrequencyCounter) -> FrequencyCounter {
        counter.remap(|id| self.enemy_name(id))
    }
}

/// Read `[{"id": ..., "name": ...}, ...]`; any failure yields no entries
fn load_reference(path: &Path) -> Vec<(String, String)> {
    if !path.exists() {
        log::debug!("Reference file {} not found", path.display());
        return Vec::new();
    }

    let entries: Vec<Value> = match fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|text| serde_json::from_str(&text).map_err(|e| e.to_string()))
    {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("⚠️  Ignoring reference file {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    entries
        .iter()
        .filter_map(|entry| {
            let id = reference_text(entry.get("id")?)?;
            let name = reference_text(entry.get("name")?)?;
            Some((id, name))
        })
        .collect()
}

fn reference_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_builtin_and_identity_fallback() {
        let names = NameResolver::builtin();
        assert_eq!(names.hero_name("berserk"), "Берсерк");
        assert_eq!(names.hero_name("mystery"), "mystery");
        assert_eq!(names.enemy_name("goblin"), "goblin");
    }

    #[test]
    fn test_load_reference_files() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(ENEMIES_FILE),
            r#"[{"id": "goblin", "name": "Гоблин"}, {"id": 7, "name": "Skeleton"}, {"id": "", "name": "x"}, {"name": "no id"}]"#,
        )
        .unwrap();
        fs::write(
            dir.path().join(HEROES_FILE),
            r#"[{"id": "wanderer", "name": "Странник"}, {"id": "monk", "name": "Монах"}]"#,
        )
        .unwrap();

        let names = NameResolver::load(Some(dir.path()));
        assert_eq!(names.enemy_name("goblin"), "Гоблин");
        assert_eq!(names.enemy_name("7"), "Skeleton");
        assert_eq!(names.enemy_name(""), "");
        // External data overrides and augments the built-in table
        assert_eq!(names.hero_name("wanderer"), "Странник");
        assert_eq!(names.hero_name("monk"), "Монах");
        assert_eq!(names.hero_name("duelist"), "Дуэлянт");
    }

    #[test]
    fn test_broken_or_missing_files_fall_back() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(HEROES_FILE), "{ definitely not a list").unwrap();

        let names = NameResolver::load(Some(dir.path()));
        assert_eq!(names.hero_name("hunter"), "Охотник");
        assert_eq!(names.enemy_name("rat"), "rat");

        let names = NameResolver::load(Some(&dir.path().join("missing")));
        assert_eq!(names.hero_name("hunter"), "Охотник");
    }
}
