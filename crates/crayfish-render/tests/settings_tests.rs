use crayfish_core::config::keys;
use crayfish_core::{ConfigStore, DataSet, DataType, Rgba};
use crayfish_render::{
    Field, MagnitudeFilter, RenderSettings, ShaftLengthMethod, ValidationError,
};
use tempfile::NamedTempFile;

// ── Helpers ──────────────────────────────────────────────────────

fn velocity() -> DataSet {
    DataSet::new("velocity", DataType::Vector)
}

/// Every stored setting changed away from its default.
fn edited(store: &ConfigStore) -> RenderSettings {
    let mut s = RenderSettings::load(store).expect("defaults load");
    s.shaft_length_method = ShaftLengthMethod::Scaled;
    s.shaft_length_min = 1.5;
    s.shaft_length_max = 80.0;
    s.shaft_length_scale = 2.5;
    s.shaft_length_fixed = 12.0;
    s.line_width = 3;
    s.head_width = 20.0;
    s.head_length = 35.0;
    s.display_vectors_on_grid = true;
    s.x_spacing = 25;
    s.y_spacing = 40;
    s.magnitude_filter = MagnitudeFilter { min: Some(0.1), max: Some(4.0) };
    s.color = Rgba::new(10, 120, 200, 180);
    s.display_trace = true;
    s.fps = 30.0;
    s
}

/// A settings value for every combination the validator distinguishes.
fn combinations(base: &RenderSettings) -> Vec<RenderSettings> {
    let mut all = Vec::new();
    let methods = [ShaftLengthMethod::MinMax, ShaftLengthMethod::Scaled, ShaftLengthMethod::Fixed];
    for method in methods {
        for (min, max) in [(0.0, 1.0), (3.0, 40.0), (5.0, 5.0), (10.0, 2.0)] {
            for grid in [false, true] {
                for (x, y) in [(1, 1), (50, 50), (0, 10), (10, 0), (-5, -5)] {
                    let mut s = base.clone();
                    s.shaft_length_method = method;
                    s.shaft_length_min = min;
                    s.shaft_length_max = max;
                    s.display_vectors_on_grid = grid;
                    s.x_spacing = x;
                    s.y_spacing = y;
                    all.push(s);
                }
            }
        }
    }
    all
}

// ── 1. Load / commit ─────────────────────────────────────────────

#[test]
fn commit_then_load_round_trips() {
    let mut ds = velocity();
    let settings = edited(ds.config());
    settings.commit(ds.config_mut()).expect("valid settings commit");

    let reloaded = RenderSettings::load(ds.config()).expect("committed settings load");
    assert_eq!(reloaded, settings);
}

#[test]
fn commit_writes_all_vector_keys() {
    let mut store = ConfigStore::new();
    let settings = edited(velocity().config());
    settings.commit(&mut store).unwrap();
    assert_eq!(store.len(), keys::VECTOR_KEYS.len());
    for key in keys::VECTOR_KEYS {
        assert!(store.contains(key), "{key} not written");
    }
}

#[test]
fn disabled_filter_round_trips() {
    let mut ds = velocity();
    let mut settings = edited(ds.config());
    settings.set_filter_by_mag(false);
    settings.commit(ds.config_mut()).unwrap();

    let reloaded = RenderSettings::load(ds.config()).unwrap();
    assert!(!reloaded.filter_by_mag());
    assert_eq!(reloaded.magnitude_filter, MagnitudeFilter::NONE);
}

#[test]
fn refused_commit_leaves_store_unchanged() {
    let mut ds = velocity();
    let before = ds.config().clone();

    let mut settings = edited(ds.config());
    settings.shaft_length_method = ShaftLengthMethod::MinMax;
    settings.shaft_length_min = 5.0;
    settings.shaft_length_max = 5.0;

    let err = settings.commit(ds.config_mut()).unwrap_err();
    assert_eq!(err, ValidationError::ShaftLengthOrder { min: 5.0, max: 5.0 });
    assert_eq!(ds.config(), &before);
}

#[test]
fn edits_do_not_touch_store_until_commit() {
    let ds = velocity();
    let before = ds.config().clone();
    let mut settings = RenderSettings::load(ds.config()).unwrap();
    settings.set_text(Field::ShaftLengthMin, "abc");
    settings.set_text(Field::Fps, "60");
    settings.set_filter_by_mag(true);
    assert_eq!(ds.config(), &before);
}

// ── 2. Validation ────────────────────────────────────────────────

#[test]
fn validate_rejects_exactly_order_and_grid_violations() {
    let base = edited(velocity().config());
    for s in combinations(&base) {
        let order_bad = s.shaft_length_method == ShaftLengthMethod::MinMax
            && s.shaft_length_min >= s.shaft_length_max;
        let grid_bad = s.display_vectors_on_grid && (s.x_spacing < 1 || s.y_spacing < 1);
        assert_eq!(
            s.validate().is_err(),
            order_bad || grid_bad,
            "method {:?}, min {}, max {}, grid {}, spacing {}x{}",
            s.shaft_length_method,
            s.shaft_length_min,
            s.shaft_length_max,
            s.display_vectors_on_grid,
            s.x_spacing,
            s.y_spacing,
        );
    }
}

#[test]
fn validation_error_names_field() {
    let mut s = edited(velocity().config());
    s.line_width = 0;
    assert_eq!(s.validate().unwrap_err().field(), Field::LineWidth);

    let mut s = edited(velocity().config());
    s.head_length = -1.0;
    assert_eq!(
        s.validate(),
        Err(ValidationError::Negative { field: Field::HeadLength, value: -1.0 })
    );
}

#[test]
fn non_finite_text_is_refused_and_store_kept() {
    let mut ds = velocity();
    let before = ds.config().clone();

    let mut settings = RenderSettings::load(ds.config()).unwrap();
    settings.set_text(Field::ShaftLengthScale, "nan");
    settings.set_text(Field::ShaftLengthMax, "inf");
    let err = settings.commit(ds.config_mut()).unwrap_err();
    assert_eq!(err.field(), Field::ShaftLengthMax);
    assert_eq!(ds.config(), &before);

    // fixing the values lets the commit through and survives a reload
    settings.set_text(Field::ShaftLengthScale, "2");
    settings.set_text(Field::ShaftLengthMax, "60");
    settings.commit(ds.config_mut()).unwrap();
    assert_eq!(RenderSettings::load(ds.config()).unwrap(), settings);

    let file = NamedTempFile::new().unwrap();
    ds.config().save_json(file.path()).unwrap();
    let restored = ConfigStore::load_json(file.path()).unwrap();
    assert_eq!(RenderSettings::load(&restored).unwrap(), settings);
}

// ── 3. Text coercion ─────────────────────────────────────────────

#[test]
fn unparsable_float_becomes_zero() {
    let mut s = RenderSettings::load(velocity().config()).unwrap();
    for field in [
        Field::ShaftLengthMin,
        Field::ShaftLengthMax,
        Field::ShaftLengthScale,
        Field::ShaftLengthFixed,
        Field::HeadWidth,
        Field::HeadLength,
        Field::Fps,
    ] {
        s.set_text(field, "abc");
    }
    assert_eq!(s.shaft_length_min, 0.0);
    assert_eq!(s.shaft_length_max, 0.0);
    assert_eq!(s.shaft_length_scale, 0.0);
    assert_eq!(s.shaft_length_fixed, 0.0);
    assert_eq!(s.head_width, 0.0);
    assert_eq!(s.head_length, 0.0);
    assert_eq!(s.fps, 0.0);

    // min = max = 0 is then caught by validation
    assert!(s.validate().is_err());
}

#[test]
fn unparsable_spacing_is_left_unchanged() {
    let mut s = RenderSettings::load(velocity().config()).unwrap();
    s.set_text(Field::XSpacing, "abc");
    s.set_text(Field::YSpacing, "");
    assert_eq!((s.x_spacing, s.y_spacing), (50, 50));

    s.display_vectors_on_grid = true;
    assert!(s.validate().is_ok());
}

// ── 4. Persistence ───────────────────────────────────────────────

#[test]
fn committed_store_survives_json() {
    let mut ds = velocity();
    let settings = edited(ds.config());
    settings.commit(ds.config_mut()).unwrap();

    let file = NamedTempFile::new().unwrap();
    ds.config().save_json(file.path()).unwrap();
    let restored = ConfigStore::load_json(file.path()).unwrap();

    assert_eq!(&restored, ds.config());
    assert_eq!(RenderSettings::load(&restored).unwrap(), settings);
}
