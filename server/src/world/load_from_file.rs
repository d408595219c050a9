use bevy_log::info;
use ron::de::from_str;
use std::fs;
use std::path::Path;

use crate::world::scene::SceneData;

pub fn load_scene_data(path: &Path) -> Result<SceneData, Box<dyn std::error::Error>> {
    if !path.exists() {
        info!(
            "Scene file not found: {}. Using the default scene.",
            path.display()
        );
        return Ok(SceneData::default());
    }

    let contents: String = fs::read_to_string(path)?;
    let scene: SceneData = from_str(&contents)?;
    scene.validate()?;

    info!("Found scene file from disk: {}", path.display());

    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_missing_scene_falls_back_to_default() {
        let scene = load_scene_data(Path::new("does/not/exist.ron")).unwrap();
        assert_eq!(scene.name, "default");
        assert!(!scene.bodies.is_empty());
    }

    #[test]
    fn test_bundled_scene_parses() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenes/default.ron");
        let scene = load_scene_data(&path).unwrap();
        assert_eq!(scene.name, "harbor");
        assert_eq!(scene.bodies.len(), 2);
        assert_eq!(scene.probes.len(), 1);
    }

    #[test]
    fn test_reserved_body_id_fails_to_load() {
        let path = std::env::temp_dir().join("water_scene_reserved_body.ron");
        fs::write(&path, "(bodies: [(id: (0))])").unwrap();
        let result = load_scene_data(&path);
        let _ = fs::remove_file(&path);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let path = std::env::temp_dir().join("water_scene_invalid_settings.ron");
        fs::write(&path, "(settings: (buoyancy_samples: 0))").unwrap();
        let result = load_scene_data(&path);
        let _ = fs::remove_file(&path);
        assert!(result.is_err());
    }
}
