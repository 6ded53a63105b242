use h5pio::File;
use ndarray::{arr2, Array2};
use num_complex::Complex;
use serial_test::serial;
use tempfile::TempDir;

#[test]
#[serial]
fn scalar_attribute_roundtrip() {
    let dir = TempDir::new().unwrap();
    let file = File::create(dir.path().join("attrs.h5")).unwrap();

    file.write_attr("float", &1.5_f32).unwrap();
    file.write_attr("double", &-0.25_f64).unwrap();
    file.write_attr("int", &-42_i32).unwrap();
    file.write_attr("uint", &42_u32).unwrap();
    file.write_attr("long", &-(1_i64 << 40)).unwrap();
    file.write_attr("ulong", &(1_u64 << 40)).unwrap();

    assert_eq!(file.attr::<f32>("float").unwrap(), 1.5);
    assert_eq!(file.attr::<f64>("double").unwrap(), -0.25);
    assert_eq!(file.attr::<i32>("int").unwrap(), -42);
    assert_eq!(file.attr::<u32>("uint").unwrap(), 42);
    assert_eq!(file.attr::<i64>("long").unwrap(), -(1_i64 << 40));
    assert_eq!(file.attr::<u64>("ulong").unwrap(), 1_u64 << 40);
}

#[test]
#[serial]
fn complex_attribute_roundtrip() {
    let dir = TempDir::new().unwrap();
    let file = File::create(dir.path().join("attrs.h5")).unwrap();

    let single = Complex::new(1.0_f32, -2.0);
    let double = Complex::new(0.5_f64, 0.75);
    file.write_attr("single", &single).unwrap();
    file.write_attr("double", &double).unwrap();

    assert_eq!(file.attr::<Complex<f32>>("single").unwrap(), single);
    assert_eq!(file.attr::<Complex<f64>>("double").unwrap(), double);
}

#[test]
#[serial]
fn bool_attribute_is_a_native_int() {
    let dir = TempDir::new().unwrap();
    let file = File::create(dir.path().join("attrs.h5")).unwrap();

    file.write_attr("yes", &true).unwrap();
    file.write_attr("no", &false).unwrap();

    assert!(file.attr::<bool>("yes").unwrap());
    assert!(!file.attr::<bool>("no").unwrap());

    // The underlying storage is an integer, as h5py writes them.
    assert_eq!(file.attr::<i32>("yes").unwrap(), 1);
    assert_eq!(file.attr::<i32>("no").unwrap(), 0);
}

#[test]
#[serial]
fn string_attribute_roundtrip() {
    let dir = TempDir::new().unwrap();
    let file = File::create(dir.path().join("attrs.h5")).unwrap();

    let text = "density ρ [kg/m³]".to_owned();
    file.write_attr("unit", &text).unwrap();
    assert_eq!(file.attr::<String>("unit").unwrap(), text);
}

#[test]
#[serial]
fn matrix_attribute_roundtrip() {
    let dir = TempDir::new().unwrap();
    let file = File::create(dir.path().join("attrs.h5")).unwrap();

    let matrix = arr2(&[[1.0_f64, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    file.write_attr("rotation", &matrix).unwrap();

    let read = file.attr::<Array2<f64>>("rotation").unwrap();
    assert_eq!(read, matrix);
}

#[test]
#[serial]
fn attributes_attach_to_groups_and_datasets() {
    let dir = TempDir::new().unwrap();
    let file = File::create(dir.path().join("attrs.h5")).unwrap();

    let group = file.create_group("run").unwrap();
    group.write_attr("step", &7_u32).unwrap();
    assert_eq!(group.attr::<u32>("step").unwrap(), 7);

    let dataset = group.create_dataset::<f64>("field", &[4]).unwrap();
    dataset.write_attr("scale", &2.5_f64).unwrap();
    assert_eq!(dataset.attr::<f64>("scale").unwrap(), 2.5);
}

#[test]
#[serial]
fn missing_attribute_is_an_error() {
    let dir = TempDir::new().unwrap();
    let file = File::create(dir.path().join("attrs.h5")).unwrap();

    assert!(file.attr::<f64>("absent").is_err());
}

#[test]
#[serial]
#[should_panic(expected = "not a matrix")]
fn matrix_attribute_read_requires_rank_two() {
    let dir = TempDir::new().unwrap();
    let file = File::create(dir.path().join("attrs.h5")).unwrap();

    file.write_attr("scalar", &1.0_f64).unwrap();
    let _ = file.attr::<Array2<f64>>("scalar");
}
