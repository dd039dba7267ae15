//! The configuration aggregate: layers, macros, colors, extensions.

use crate::constants::CURRENT_SCHEMA_VERSION;
use crate::error::{CoreError, ValidationError, ValidationErrorKind};
use crate::models::key::is_macro_name;
use crate::models::{
    BootConfig, ExtensionConfig, HardwareProfile, KeyAssignment, Layer, MacroAction, Position,
    RgbColor, RgbConfig,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Everything the user configures for one keyboard.
///
/// Invariant: there is always at least one layer. Mutations that would
/// break an invariant fail and leave the configuration unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Schema version tag
    pub version: String,
    #[serde(rename = "keymap_data")]
    layers: Vec<Layer>,
    /// Named macros
    #[serde(default)]
    pub macros: BTreeMap<String, Vec<MacroAction>>,
    /// RGB matrix settings
    #[serde(rename = "rgb_matrix_config", default)]
    pub rgb: RgbConfig,
    /// Extension settings
    #[serde(default)]
    pub extensions: ExtensionConfig,
    /// Boot settings
    #[serde(rename = "boot_config", default)]
    pub boot: BootConfig,
    /// Python appended verbatim before `keyboard.go()`
    #[serde(default)]
    pub custom_code: String,
    /// Top-level fields this version does not know about
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn layer_out_of_range(layer: usize, count: usize) -> ValidationError {
    ValidationError::new(
        ValidationErrorKind::LayerOutOfRange,
        format!("Layer {layer} does not exist (have {count})"),
    )
    .with_layer(layer)
}

impl Configuration {
    /// Creates a configuration with one empty layer sized for `profile`.
    #[must_use]
    pub fn new(profile: &HardwareProfile) -> Self {
        Self {
            version: CURRENT_SCHEMA_VERSION.to_string(),
            layers: vec![Layer::new(profile.rows, profile.cols)],
            macros: BTreeMap::new(),
            rgb: RgbConfig::default(),
            extensions: ExtensionConfig::default(),
            boot: BootConfig::default(),
            custom_code: String::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Builds a configuration from existing layers.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if `layers` is empty.
    pub fn from_layers(layers: Vec<Layer>) -> Result<Self, CoreError> {
        if layers.is_empty() {
            return Err(CoreError::InvariantViolation(
                "a configuration needs at least one layer".to_string(),
            ));
        }
        let mut config = Self::new(&HardwareProfile::default());
        config.layers = layers;
        Ok(config)
    }

    /// All layers, base layer first.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Number of layers.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Gets a layer.
    ///
    /// # Errors
    ///
    /// Returns `LayerOutOfRange` if the layer does not exist.
    pub fn layer(&self, index: usize) -> Result<&Layer, ValidationError> {
        self.layers
            .get(index)
            .ok_or_else(|| layer_out_of_range(index, self.layers.len()))
    }

    fn layer_mut(&mut self, index: usize) -> Result<&mut Layer, ValidationError> {
        let count = self.layers.len();
        self.layers
            .get_mut(index)
            .ok_or_else(|| layer_out_of_range(index, count))
    }

    /// Gets the key at a grid position.
    ///
    /// # Errors
    ///
    /// Returns `LayerOutOfRange` or `KeyIndexOutOfRange`.
    pub fn key(&self, layer: usize, position: Position) -> Result<&KeyAssignment, ValidationError> {
        let grid = self.layer(layer)?;
        grid.get_at(position).ok_or_else(|| {
            ValidationError::new(
                ValidationErrorKind::KeyIndexOutOfRange,
                format!(
                    "Position ({}, {}) is outside the {}x{} grid",
                    position.row,
                    position.col,
                    grid.rows(),
                    grid.cols()
                ),
            )
            .with_layer(layer)
        })
    }

    /// Sets the key at a grid position.
    ///
    /// # Errors
    ///
    /// Returns `LayerOutOfRange`, `KeyIndexOutOfRange`, or `InvalidKeycode`
    /// when the assignment has no stable token form.
    pub fn set_key(
        &mut self,
        layer: usize,
        position: Position,
        assignment: KeyAssignment,
    ) -> Result<(), ValidationError> {
        let grid = self.layer_mut(layer)?;
        let index = grid.index_of(position).ok_or_else(|| {
            ValidationError::new(
                ValidationErrorKind::KeyIndexOutOfRange,
                format!(
                    "Position ({}, {}) is outside the {}x{} grid",
                    position.row,
                    position.col,
                    grid.rows(),
                    grid.cols()
                ),
            )
            .with_layer(layer)
        })?;
        grid.set(index, assignment)
            .map_err(|e| e.with_layer(layer))
    }

    /// Gets the key at a flattened index.
    ///
    /// # Errors
    ///
    /// Returns `LayerOutOfRange` or `KeyIndexOutOfRange`.
    pub fn key_at_index(&self, layer: usize, index: usize) -> Result<&KeyAssignment, ValidationError> {
        let grid = self.layer(layer)?;
        grid.get(index).ok_or_else(|| {
            ValidationError::new(
                ValidationErrorKind::KeyIndexOutOfRange,
                format!("Key index {index} is outside 0..{}", grid.len()),
            )
            .with_layer(layer)
            .with_key(index)
        })
    }

    /// Sets the key at a flattened index.
    ///
    /// # Errors
    ///
    /// As [`Self::set_key`].
    pub fn set_key_at_index(
        &mut self,
        layer: usize,
        index: usize,
        assignment: KeyAssignment,
    ) -> Result<(), ValidationError> {
        self.layer_mut(layer)?
            .set(index, assignment)
            .map_err(|e| e.with_layer(layer))
    }

    /// Checks that every key has a token that loads back unchanged.
    ///
    /// # Errors
    ///
    /// Returns the first `InvalidKeycode`, located by layer and key.
    pub fn check_tokens(&self) -> Result<(), ValidationError> {
        for (layer_index, layer) in self.layers.iter().enumerate() {
            for (key_index, key) in layer.keys().iter().enumerate() {
                key.check_token()
                    .map_err(|e| e.with_layer(layer_index).with_key(key_index))?;
            }
        }
        Ok(())
    }

    /// Appends a layer of `KC.NO` shaped like the base layer.
    ///
    /// Returns the new layer's index.
    pub fn add_layer(&mut self) -> usize {
        let (rows, cols) = self
            .layers
            .first()
            .map_or((0, 0), |base| (base.rows(), base.cols()));
        self.layers.push(Layer::new(rows, cols));
        self.layers.len() - 1
    }

    /// Removes a layer.
    ///
    /// Per-layer color overrides of higher layers move down with them.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` when removing the last layer and
    /// `LayerOutOfRange` for a missing index.
    pub fn remove_layer(&mut self, index: usize) -> Result<Layer, CoreError> {
        if index >= self.layers.len() {
            return Err(layer_out_of_range(index, self.layers.len()).into());
        }
        if self.layers.len() == 1 {
            return Err(CoreError::InvariantViolation(
                "cannot remove the only remaining layer".to_string(),
            ));
        }
        self.rgb.remove_layer_overrides(index);
        Ok(self.layers.remove(index))
    }

    /// Deep copy of a layer's grid.
    ///
    /// # Errors
    ///
    /// Returns `LayerOutOfRange` if the layer does not exist.
    pub fn copy_layer(&self, index: usize) -> Result<Layer, ValidationError> {
        self.layer(index).cloned()
    }

    /// Replaces a layer's grid with a copy of `source`.
    ///
    /// # Errors
    ///
    /// Returns `LayerOutOfRange`, or `DimensionMismatch` if the shapes differ.
    pub fn paste_layer(&mut self, index: usize, source: &Layer) -> Result<(), ValidationError> {
        let target = self.layer_mut(index)?;
        if (target.rows(), target.cols()) != (source.rows(), source.cols()) {
            return Err(ValidationError::new(
                ValidationErrorKind::DimensionMismatch,
                format!(
                    "Cannot paste a {}x{} layer onto a {}x{} layer",
                    source.rows(),
                    source.cols(),
                    target.rows(),
                    target.cols()
                ),
            )
            .with_layer(index));
        }
        *target = source.clone();
        Ok(())
    }

    /// Adds a macro.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` for an invalid or duplicate name.
    pub fn add_macro(
        &mut self,
        name: impl Into<String>,
        actions: Vec<MacroAction>,
    ) -> Result<(), CoreError> {
        let name = name.into();
        if !is_macro_name(&name) {
            return Err(CoreError::InvariantViolation(format!(
                "macro name '{name}' must be a non-empty identifier"
            )));
        }
        if self.macros.contains_key(&name) {
            return Err(CoreError::InvariantViolation(format!(
                "macro '{name}' already exists"
            )));
        }
        self.macros.insert(name, actions);
        Ok(())
    }

    /// Renames a macro and rewrites every key that references it.
    ///
    /// Returns the number of keys rewritten.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if `old` is missing or `new` is invalid
    /// or taken.
    pub fn rename_macro(&mut self, old: &str, new: &str) -> Result<usize, CoreError> {
        if !self.macros.contains_key(old) {
            return Err(CoreError::InvariantViolation(format!(
                "macro '{old}' does not exist"
            )));
        }
        if old == new {
            return Ok(0);
        }
        if !is_macro_name(new) {
            return Err(CoreError::InvariantViolation(format!(
                "macro name '{new}' must be a non-empty identifier"
            )));
        }
        if self.macros.contains_key(new) {
            return Err(CoreError::InvariantViolation(format!(
                "macro '{new}' already exists"
            )));
        }

        if let Some(actions) = self.macros.remove(old) {
            self.macros.insert(new.to_string(), actions);
        }

        let mut rewritten = 0;
        for layer in &mut self.layers {
            for index in 0..layer.len() {
                if layer.get(index).and_then(KeyAssignment::macro_name) == Some(old) {
                    layer
                        .set(index, KeyAssignment::macro_ref(new))
                        .map_err(CoreError::from)?;
                    rewritten += 1;
                }
            }
        }
        Ok(rewritten)
    }

    /// Removes a macro, leaving any key references dangling.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if the macro does not exist.
    pub fn remove_macro(&mut self, name: &str) -> Result<Vec<MacroAction>, CoreError> {
        self.macros
            .remove(name)
            .ok_or_else(|| CoreError::InvariantViolation(format!("macro '{name}' does not exist")))
    }

    /// Sets a global palette color after checking the index and color.
    ///
    /// # Errors
    ///
    /// Returns `KeyIndexOutOfRange` or `MalformedColor`.
    pub fn set_key_color(&mut self, key: usize, color: &str) -> Result<(), ValidationError> {
        let parsed = RgbColor::from_hex(color).map_err(|e| e.with_key(key))?;
        self.check_key_index(key)?;
        self.rgb.key_colors.insert(key, parsed.to_hex());
        Ok(())
    }

    /// Sets a per-layer override color after checking indices and color.
    ///
    /// # Errors
    ///
    /// Returns `LayerOutOfRange`, `KeyIndexOutOfRange` or `MalformedColor`.
    pub fn set_layer_key_color(
        &mut self,
        layer: usize,
        key: usize,
        color: &str,
    ) -> Result<(), ValidationError> {
        self.layer(layer)?;
        let parsed = RgbColor::from_hex(color).map_err(|e| e.with_layer(layer).with_key(key))?;
        self.check_key_index(key).map_err(|e| e.with_layer(layer))?;
        self.rgb.set_layer_override(layer, key, parsed.to_hex());
        Ok(())
    }

    fn check_key_index(&self, key: usize) -> Result<(), ValidationError> {
        let count = self.layers.first().map_or(0, Layer::len);
        if key < count {
            Ok(())
        } else {
            Err(ValidationError::new(
                ValidationErrorKind::KeyIndexOutOfRange,
                format!("Key index {key} is outside 0..{count}"),
            )
            .with_key(key))
        }
    }

    /// Pads or truncates every layer to the profile's grid.
    ///
    /// Returns true if any layer changed shape.
    pub fn conform_to(&mut self, profile: &HardwareProfile) -> bool {
        let mut changed = false;
        for layer in &mut self.layers {
            if (layer.rows(), layer.cols()) != (profile.rows, profile.cols) {
                *layer = layer.resized(profile.rows, profile.cols);
                changed = true;
            }
        }
        changed
    }

    /// Iterates `(layer, key index, assignment)` over every key.
    pub fn keys(&self) -> impl Iterator<Item = (usize, usize, &KeyAssignment)> {
        self.layers.iter().enumerate().flat_map(|(layer_idx, layer)| {
            layer
                .keys()
                .iter()
                .enumerate()
                .map(move |(key_idx, key)| (layer_idx, key_idx, key))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LayerMode;

    fn config() -> Configuration {
        Configuration::new(&HardwareProfile::chronos_pad())
    }

    #[test]
    fn test_new_has_one_no_op_layer() {
        let cfg = config();
        assert_eq!(cfg.layer_count(), 1);
        assert_eq!(cfg.layers()[0].len(), 20);
        assert_eq!(cfg.version, "2.0");
    }

    #[test]
    fn test_set_and_get_key() {
        let mut cfg = config();
        cfg.set_key(0, Position::new(4, 3), KeyAssignment::Letter('A'))
            .unwrap();
        assert_eq!(cfg.key_at_index(0, 19).unwrap(), &KeyAssignment::Letter('A'));
    }

    #[test]
    fn test_out_of_range_access() {
        let mut cfg = config();
        let err = cfg.key(0, Position::new(5, 0)).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::KeyIndexOutOfRange);

        let err = cfg
            .set_key(3, Position::new(0, 0), KeyAssignment::NoOp)
            .unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::LayerOutOfRange);

        let err = cfg.set_key_at_index(0, 20, KeyAssignment::NoOp).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::KeyIndexOutOfRange);
        assert_eq!(err.layer, Some(0));
    }

    #[test]
    fn test_add_layer_defaults_to_no_op() {
        let mut cfg = config();
        let index = cfg.add_layer();
        assert_eq!(index, 1);
        assert!(cfg.layers()[1].keys().iter().all(KeyAssignment::is_no_op));
    }

    #[test]
    fn test_remove_last_layer_is_rejected() {
        let mut cfg = config();
        let err = cfg.remove_layer(0).unwrap_err();
        assert!(matches!(err, CoreError::InvariantViolation(_)));
        assert_eq!(cfg.layer_count(), 1);
    }

    #[test]
    fn test_remove_layer_shifts_overrides() {
        let mut cfg = config();
        cfg.add_layer();
        cfg.add_layer();
        cfg.set_layer_key_color(1, 0, "#FF0000").unwrap();
        cfg.set_layer_key_color(2, 0, "#00FF00").unwrap();
        cfg.remove_layer(1).unwrap();
        assert_eq!(cfg.layer_count(), 2);
        assert_eq!(cfg.rgb.layer_override(1, 0), Some("#00FF00"));
    }

    #[test]
    fn test_copy_paste_layer_is_deep() {
        let mut cfg = config();
        cfg.set_key_at_index(0, 0, KeyAssignment::layer(1, LayerMode::Momentary))
            .unwrap();
        cfg.add_layer();
        let copy = cfg.copy_layer(0).unwrap();
        cfg.paste_layer(1, &copy).unwrap();
        cfg.set_key_at_index(0, 0, KeyAssignment::NoOp).unwrap();
        assert_eq!(
            cfg.key_at_index(1, 0).unwrap(),
            &KeyAssignment::layer(1, LayerMode::Momentary)
        );
    }

    #[test]
    fn test_paste_shape_mismatch() {
        let mut cfg = config();
        let err = cfg.paste_layer(0, &Layer::new(2, 2)).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::DimensionMismatch);
    }

    #[test]
    fn test_add_macro_rejects_duplicates_and_bad_names() {
        let mut cfg = config();
        cfg.add_macro("GREET", vec![MacroAction::Text("hi".into())])
            .unwrap();
        assert!(matches!(
            cfg.add_macro("GREET", vec![]),
            Err(CoreError::InvariantViolation(_))
        ));
        assert!(matches!(
            cfg.add_macro("", vec![]),
            Err(CoreError::InvariantViolation(_))
        ));
        assert!(matches!(
            cfg.add_macro("has space", vec![]),
            Err(CoreError::InvariantViolation(_))
        ));
        assert_eq!(cfg.macros.len(), 1);
    }

    #[test]
    fn test_rename_macro_rewrites_references() {
        let mut cfg = config();
        cfg.add_macro("OLD", vec![]).unwrap();
        cfg.set_key_at_index(0, 3, KeyAssignment::macro_ref("OLD"))
            .unwrap();
        let rewritten = cfg.rename_macro("OLD", "NEW").unwrap();
        assert_eq!(rewritten, 1);
        assert!(cfg.macros.contains_key("NEW"));
        assert_eq!(cfg.key_at_index(0, 3).unwrap(), &KeyAssignment::macro_ref("NEW"));
    }

    #[test]
    fn test_remove_macro_leaves_reference() {
        let mut cfg = config();
        cfg.add_macro("GONE", vec![]).unwrap();
        cfg.set_key_at_index(0, 0, KeyAssignment::macro_ref("GONE"))
            .unwrap();
        cfg.remove_macro("GONE").unwrap();
        assert_eq!(cfg.key_at_index(0, 0).unwrap(), &KeyAssignment::macro_ref("GONE"));
        assert!(cfg.remove_macro("GONE").is_err());
    }

    #[test]
    fn test_set_colors_validate() {
        let mut cfg = config();
        assert_eq!(
            cfg.set_key_color(0, "#XYZ").unwrap_err().kind,
            ValidationErrorKind::MalformedColor
        );
        assert_eq!(
            cfg.set_key_color(20, "#FFFFFF").unwrap_err().kind,
            ValidationErrorKind::KeyIndexOutOfRange
        );
        assert_eq!(
            cfg.set_layer_key_color(1, 0, "#FFFFFF").unwrap_err().kind,
            ValidationErrorKind::LayerOutOfRange
        );
        cfg.set_key_color(2, "ff8800").unwrap();
        assert_eq!(cfg.rgb.key_colors.get(&2).map(String::as_str), Some("#FF8800"));
    }

    #[test]
    fn test_conform_to_pads_layers() {
        let mut cfg = Configuration::from_layers(vec![Layer::new(2, 2)]).unwrap();
        assert!(cfg.conform_to(&HardwareProfile::chronos_pad()));
        assert_eq!(cfg.layers()[0].len(), 20);
        assert!(!cfg.conform_to(&HardwareProfile::chronos_pad()));
    }

    #[test]
    fn test_from_layers_requires_one() {
        assert!(Configuration::from_layers(vec![]).is_err());
    }
}
