//! Layer and macro reference tracking.
//!
//! Layer-switch keys and macro keys point at other parts of the
//! configuration by index or name. Nothing stops those targets from
//! disappearing (a layer is removed, a macro deleted), so these queries
//! report references without failing.

use crate::models::{Configuration, KeyAssignment, LayerMode, Position};
use std::collections::{BTreeMap, BTreeSet};

/// A reference from one layer to another via a layer-switch key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerRef {
    /// Source layer index (where the key is)
    pub from_layer: usize,
    /// Target layer index (which layer it activates)
    pub to_layer: usize,
    /// Position of the key in the source layer
    pub position: Position,
    /// How the key activates the target
    pub kind: LayerMode,
    /// The full keycode token (e.g. `KC.MO(1)`)
    pub keycode: String,
}

/// A key that invokes a named macro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroRef {
    /// Layer index
    pub layer: usize,
    /// Flattened key index
    pub key: usize,
    /// Referenced macro name
    pub name: String,
}

fn layer_refs(config: &Configuration) -> impl Iterator<Item = LayerRef> + '_ {
    config.layers().iter().enumerate().flat_map(|(from_layer, layer)| {
        layer.keys().iter().enumerate().filter_map(move |(idx, key)| {
            let switch = key.layer_switch()?;
            Some(LayerRef {
                from_layer,
                to_layer: switch.target,
                position: layer.position_of(idx)?,
                kind: switch.mode,
                keycode: key.to_string(),
            })
        })
    })
}

/// Builds a reverse index: target layer → every key that activates it.
///
/// References to layers that do not exist are left out; see
/// [`dangling_layer_references`].
///
/// # Examples
///
/// ```
/// use kmkpad::models::{Configuration, HardwareProfile, KeyAssignment, LayerMode};
/// use kmkpad::services::references::build_layer_ref_index;
///
/// let mut config = Configuration::new(&HardwareProfile::chronos_pad());
/// config.add_layer();
/// config.set_key_at_index(0, 0, KeyAssignment::layer(1, LayerMode::Momentary)).unwrap();
///
/// let index = build_layer_ref_index(&config);
/// assert_eq!(index.get(&1).unwrap().len(), 1);
/// ```
#[must_use]
pub fn build_layer_ref_index(config: &Configuration) -> BTreeMap<usize, Vec<LayerRef>> {
    let layer_count = config.layer_count();
    let mut index: BTreeMap<usize, Vec<LayerRef>> = BTreeMap::new();
    for layer_ref in layer_refs(config).filter(|r| r.to_layer < layer_count) {
        index.entry(layer_ref.to_layer).or_default().push(layer_ref);
    }
    index
}

/// Layer-switch keys whose target layer does not exist.
#[must_use]
pub fn dangling_layer_references(config: &Configuration) -> Vec<LayerRef> {
    let layer_count = config.layer_count();
    layer_refs(config)
        .filter(|r| r.to_layer >= layer_count)
        .collect()
}

/// Checks whether putting `new_key` at `position` on `target_layer` hides
/// a position that a hold-like key on a lower layer expects to reach.
///
/// Hold keys on higher layers that point back down are return keys and
/// never conflict.
///
/// Returns a warning message when there is a conflict.
#[must_use]
pub fn check_transparency_conflict(
    target_layer: usize,
    position: Position,
    new_key: &KeyAssignment,
    layer_refs: &BTreeMap<usize, Vec<LayerRef>>,
) -> Option<String> {
    if new_key.is_transparent() {
        return None;
    }

    let refs = layer_refs.get(&target_layer)?;
    let conflicting: Vec<String> = refs
        .iter()
        .filter(|r| {
            r.position == position && r.kind.is_hold_like() && r.from_layer < target_layer
        })
        .map(|r| format!("Layer {} {}", r.from_layer, r.kind.display_name()))
        .collect();

    if conflicting.is_empty() {
        return None;
    }

    Some(format!(
        "This position is held from {}. Consider KC.TRNS to keep the hold key working.",
        conflicting.join(", ")
    ))
}

/// Macro keys whose macro is not defined, in layer/key order.
///
/// The generated firmware binds these to `KC.NO`, so they are inert at
/// runtime rather than an error.
#[must_use]
pub fn dangling_macro_references(config: &Configuration) -> Vec<MacroRef> {
    config
        .keys()
        .filter_map(|(layer, key, assignment)| {
            let name = assignment.macro_name()?;
            (!config.macros.contains_key(name)).then(|| MacroRef {
                layer,
                key,
                name: name.to_string(),
            })
        })
        .collect()
}

/// Defined macros that no key invokes, in name order.
#[must_use]
pub fn unused_macros(config: &Configuration) -> Vec<&str> {
    let used: BTreeSet<&str> = config
        .keys()
        .filter_map(|(_, _, assignment)| assignment.macro_name())
        .collect();
    config
        .macros
        .keys()
        .map(String::as_str)
        .filter(|name| !used.contains(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HardwareProfile, MacroAction};

    fn config(layers: usize) -> Configuration {
        let mut cfg = Configuration::new(&HardwareProfile::chronos_pad());
        for _ in 1..layers {
            cfg.add_layer();
        }
        cfg
    }

    #[test]
    fn test_build_layer_ref_index_basic() {
        let mut cfg = config(3);
        cfg.set_key_at_index(0, 0, KeyAssignment::layer(1, LayerMode::Momentary)).unwrap();
        cfg.set_key_at_index(0, 1, KeyAssignment::layer(2, LayerMode::Toggle)).unwrap();

        let index = build_layer_ref_index(&cfg);

        assert_eq!(index[&1].len(), 1);
        assert_eq!(index[&1][0].kind, LayerMode::Momentary);
        assert_eq!(index[&1][0].position, Position::new(0, 0));
        assert_eq!(index[&1][0].keycode, "KC.MO(1)");

        assert_eq!(index[&2][0].position, Position::new(0, 1));
        assert!(index.get(&0).is_none());
    }

    #[test]
    fn test_missing_targets_are_dangling() {
        let mut cfg = config(2);
        cfg.set_key_at_index(1, 7, KeyAssignment::layer(4, LayerMode::To)).unwrap();

        assert!(build_layer_ref_index(&cfg).is_empty());
        let dangling = dangling_layer_references(&cfg);
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].from_layer, 1);
        assert_eq!(dangling[0].position, Position::new(1, 3));
    }

    #[test]
    fn test_transparency_conflict_for_hold_keys() {
        let mut cfg = config(2);
        cfg.set_key_at_index(0, 0, KeyAssignment::layer(1, LayerMode::Momentary)).unwrap();
        let index = build_layer_ref_index(&cfg);

        let warning =
            check_transparency_conflict(1, Position::new(0, 0), &KeyAssignment::Letter('A'), &index);
        assert!(warning.unwrap().contains("Layer 0 Momentary (MO)"));

        assert!(check_transparency_conflict(
            1,
            Position::new(0, 0),
            &KeyAssignment::Transparent,
            &index
        )
        .is_none());
        assert!(check_transparency_conflict(
            1,
            Position::new(0, 1),
            &KeyAssignment::Letter('A'),
            &index
        )
        .is_none());
    }

    #[test]
    fn test_return_keys_do_not_conflict() {
        let mut cfg = config(2);
        cfg.set_key_at_index(1, 0, KeyAssignment::layer(0, LayerMode::Momentary)).unwrap();
        let index = build_layer_ref_index(&cfg);
        assert!(check_transparency_conflict(
            0,
            Position::new(0, 0),
            &KeyAssignment::Letter('A'),
            &index
        )
        .is_none());
    }

    #[test]
    fn test_toggle_is_not_hold_like() {
        let mut cfg = config(2);
        cfg.set_key_at_index(0, 0, KeyAssignment::layer(1, LayerMode::Toggle)).unwrap();
        let index = build_layer_ref_index(&cfg);
        assert!(check_transparency_conflict(
            1,
            Position::new(0, 0),
            &KeyAssignment::Letter('A'),
            &index
        )
        .is_none());
    }

    #[test]
    fn test_dangling_macro_references() {
        let mut cfg = config(2);
        cfg.add_macro("GREET", vec![MacroAction::Text("hi".into())]).unwrap();
        cfg.set_key_at_index(0, 0, KeyAssignment::macro_ref("GREET")).unwrap();
        cfg.set_key_at_index(1, 3, KeyAssignment::macro_ref("GONE")).unwrap();

        let dangling = dangling_macro_references(&cfg);
        assert_eq!(
            dangling,
            vec![MacroRef {
                layer: 1,
                key: 3,
                name: "GONE".into()
            }]
        );
    }

    #[test]
    fn test_unused_macros() {
        let mut cfg = config(1);
        cfg.add_macro("USED", vec![MacroAction::Text("a".into())]).unwrap();
        cfg.add_macro("IDLE", vec![MacroAction::Text("b".into())]).unwrap();
        cfg.set_key_at_index(0, 2, KeyAssignment::macro_ref("USED")).unwrap();
        assert_eq!(unused_macros(&cfg), vec!["IDLE"]);
    }
}
