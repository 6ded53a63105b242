use h5pio::File;
use ndarray::arr2;
use num_complex::Complex;
use serial_test::serial;
use tempfile::TempDir;

#[test]
#[serial]
fn full_array_roundtrip() {
    let dir = TempDir::new().unwrap();
    let file = File::create(dir.path().join("data.h5")).unwrap();

    let data: Vec<f64> = (0..10).map(f64::from).collect();
    let dataset = file.create_dataset::<f64>("sequence", &[10]).unwrap();
    dataset.write(&data).unwrap();

    assert_eq!(dataset.rank(), 1);
    assert_eq!(dataset.shape(), vec![10]);
    assert_eq!(dataset.size(), 10);
    assert_eq!(dataset.read().unwrap(), data);
}

#[test]
#[serial]
fn integer_roundtrip() {
    let dir = TempDir::new().unwrap();
    let file = File::create(dir.path().join("data.h5")).unwrap();

    let data = vec![-3_i32, 0, 7, i32::MAX];
    file.write_dataset("ints", &data).unwrap();
    assert_eq!(file.dataset::<i32>("ints").unwrap().read().unwrap(), data);

    let data = vec![0_u64, 1 << 40, u64::MAX];
    file.write_dataset("ulongs", &data).unwrap();
    assert_eq!(file.dataset::<u64>("ulongs").unwrap().read().unwrap(), data);
}

#[test]
#[serial]
fn matrix_roundtrip() {
    let dir = TempDir::new().unwrap();
    let file = File::create(dir.path().join("data.h5")).unwrap();

    let matrix = arr2(&[[1.0_f64, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    file.write_dataset_matrix("field", &matrix).unwrap();

    let dataset = file.dataset::<f64>("field").unwrap();
    assert_eq!(dataset.shape(), vec![2, 3]);
    assert_eq!(dataset.read_matrix().unwrap(), matrix);
}

#[test]
#[serial]
fn complex_values_are_adjacent_float_pairs() {
    let dir = TempDir::new().unwrap();
    let file = File::create(dir.path().join("data.h5")).unwrap();

    let data = vec![Complex::new(1.0_f64, 2.0), Complex::new(-3.0, 4.0)];
    file.write_dataset("amplitudes", &data).unwrap();

    let read = file
        .dataset::<Complex<f64>>("amplitudes")
        .unwrap()
        .read()
        .unwrap();
    assert_eq!(read, data);

    // Reinterpreted as raw floats, each value is (real, imaginary).
    let raw: &[f64] =
        unsafe { std::slice::from_raw_parts(read.as_ptr() as *const f64, read.len() * 2) };
    assert_eq!(raw, &[1.0, 2.0, -3.0, 4.0]);
}

#[test]
#[serial]
#[should_panic(expected = "buffer does not match the dataset extent")]
fn dimension_mismatch_is_fatal() {
    let dir = TempDir::new().unwrap();
    let file = File::create(dir.path().join("data.h5")).unwrap();

    let dataset = file.create_dataset::<f64>("sequence", &[4]).unwrap();
    let _ = dataset.write(&[1.0, 2.0, 3.0]);
}

#[test]
#[serial]
#[should_panic(expected = "matrix does not match the dataset extent")]
fn matrix_dimension_mismatch_is_fatal() {
    let dir = TempDir::new().unwrap();
    let file = File::create(dir.path().join("data.h5")).unwrap();

    let dataset = file.create_dataset::<f64>("field", &[3, 3]).unwrap();
    let _ = dataset.write_matrix(&arr2(&[[1.0_f64, 2.0], [3.0, 4.0]]));
}
