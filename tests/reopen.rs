use h5pio::File;
use serial_test::serial;
use tempfile::TempDir;

#[test]
#[serial]
fn file_contents_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("run.h5");

    let data: Vec<f64> = (0..6).map(f64::from).collect();
    {
        let file = File::create(&path).unwrap();
        let outer = file.create_group("results").unwrap();
        let inner = outer.create_group("step-001").unwrap();
        inner.write_dataset("pressure", &data).unwrap();
        inner.write_attr("time", &0.5_f64).unwrap();
    }

    let file = File::open(&path).unwrap();
    let inner = file.group("results").unwrap().group("step-001").unwrap();
    assert_eq!(inner.attr::<f64>("time").unwrap(), 0.5);

    let dataset = inner.dataset::<f64>("pressure").unwrap();
    assert_eq!(dataset.rank(), 1);
    assert_eq!(dataset.size(), 6);
    assert_eq!(dataset.read().unwrap(), data);
}

#[test]
#[serial]
fn opening_with_the_wrong_element_type_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("run.h5");

    let file = File::create(&path).unwrap();
    file.write_dataset("pressure", &[1.0_f64, 2.0]).unwrap();

    assert!(file.dataset::<i32>("pressure").is_err());
    assert!(file.dataset::<f64>("pressure").is_ok());
}

#[test]
#[serial]
fn opening_a_group_as_a_dataset_is_an_error() {
    let dir = TempDir::new().unwrap();
    let file = File::create(dir.path().join("run.h5")).unwrap();

    file.create_group("results").unwrap();
    assert!(file.dataset::<f64>("results").is_err());
}

#[test]
#[serial]
fn group_open_never_creates() {
    let dir = TempDir::new().unwrap();
    let file = File::create(dir.path().join("run.h5")).unwrap();

    assert!(file.group("absent").is_err());

    file.create_group("present").unwrap();
    assert!(file.group("present").is_ok());
    assert!(file.create_group("present").is_err());
}

#[test]
#[serial]
fn opening_a_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    assert!(File::open(dir.path().join("absent.h5")).is_err());
}
