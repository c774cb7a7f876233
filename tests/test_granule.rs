use approx::assert_relative_eq;
use std::path::{Path, PathBuf};
use vnp21imgnrt::{ReadOptions, Vnp21Error, Vnp21ImgNrtGranule};

const ROWS: usize = 3;
const COLS: usize = 4;
const GRANULE_NAME: &str = "VNP21IMG_NRT.A2024123.1218.002.2024123133012.nc";

const LATITUDE: [f32; ROWS * COLS] = [
    34.0, 34.0, 34.0, 34.0, //
    34.5, 34.5, 34.5, -999.0, //
    35.0, 35.0, 35.0, 35.0,
];
const LONGITUDE: [f32; ROWS * COLS] = [
    -119.0, -118.5, -118.0, -117.5, //
    -119.0, -118.5, -118.0, -117.5, //
    -119.0, -118.5, -118.0, -117.5,
];
// scale 0.02, fill 0
const LST: [u16; ROWS * COLS] = [
    15000, 14500, 0, 14000, //
    15500, 15000, 14800, 0, //
    14900, 14600, 14700, 14800,
];
// scale 0.04, fill 0
const LST_ERR: [u8; ROWS * COLS] = [25, 30, 0, 40, 25, 25, 25, 0, 20, 20, 20, 20];
// scale 0.002, offset 0.5, fill 0; 255 decodes above 1
const EMIS_I5: [u8; ROWS * COLS] = [200, 255, 0, 240, 210, 220, 230, 0, 250, 245, 235, 225];
const EMIS_I5_ERR: [u8; ROWS * COLS] = [10, 12, 0, 15, 10, 10, 10, 0, 8, 8, 8, 8];
// scale 0.5, fill 255
const VIEW_ANGLE: [u8; ROWS * COLS] = [0, 20, 40, 60, 0, 20, 40, 255, 0, 20, 40, 60];
// bits 4-5 set on cloudy pixels
const QC: [u16; ROWS * COLS] = [
    0x00, 0x10, 0x00, 0x20, //
    0x30, 0x0f, 0x01, 0x00, //
    0x00, 0x00, 0x40, 0x10,
];

fn write_granule(path: &Path) -> Result<(), netcdf::Error> {
    let mut file = netcdf::create(path)?;
    let mut swath = file.add_group("VIIRS_I5_LST")?;

    {
        let mut geo = swath.add_group("Geolocation Fields")?;
        geo.add_dimension("Along_Track", ROWS)?;
        geo.add_dimension("Along_Scan", COLS)?;

        let mut lat = geo.add_variable::<f32>("Latitude", &["Along_Track", "Along_Scan"])?;
        lat.put_attribute("_FillValue", -999.0f32)?;
        lat.put_attribute("units", "degrees_north")?;
        lat.put_values(&LATITUDE, ..)?;

        let mut lon = geo.add_variable::<f32>("Longitude", &["Along_Track", "Along_Scan"])?;
        lon.put_attribute("_FillValue", -999.0f32)?;
        lon.put_attribute("units", "degrees_east")?;
        lon.put_values(&LONGITUDE, ..)?;
    }

    let mut data = swath.add_group("Data Fields")?;
    data.add_dimension("Along_Track", ROWS)?;
    data.add_dimension("Along_Scan", COLS)?;
    let dims = ["Along_Track", "Along_Scan"];

    let mut lst = data.add_variable::<u16>("LST", &dims)?;
    lst.put_attribute("_FillValue", 0u16)?;
    lst.put_attribute("scale_factor", 0.02f32)?;
    lst.put_attribute("add_offset", 0.0f32)?;
    lst.put_attribute("units", "K")?;
    lst.put_values(&LST, ..)?;

    let mut lst_err = data.add_variable::<u8>("LST_err", &dims)?;
    lst_err.put_attribute("_FillValue", 0u8)?;
    lst_err.put_attribute("scale_factor", 0.04f32)?;
    lst_err.put_attribute("add_offset", 0.0f32)?;
    lst_err.put_values(&LST_ERR, ..)?;

    let mut emis = data.add_variable::<u8>("Emis_I5", &dims)?;
    emis.put_attribute("_FillValue", 0u8)?;
    emis.put_attribute("scale_factor", 0.002f32)?;
    emis.put_attribute("add_offset", 0.5f32)?;
    emis.put_values(&EMIS_I5, ..)?;

    let mut emis_err = data.add_variable::<u8>("Emis_I5_err", &dims)?;
    emis_err.put_attribute("_FillValue", 0u8)?;
    emis_err.put_attribute("scale_factor", 0.0001f32)?;
    emis_err.put_attribute("add_offset", 0.0f32)?;
    emis_err.put_values(&EMIS_I5_ERR, ..)?;

    let mut view = data.add_variable::<u8>("View_angle", &dims)?;
    view.put_attribute("_FillValue", 255u8)?;
    view.put_attribute("scale_factor", 0.5f32)?;
    view.put_attribute("add_offset", 0.0f32)?;
    view.put_values(&VIEW_ANGLE, ..)?;

    let mut qc = data.add_variable::<u16>("QC", &dims)?;
    qc.put_values(&QC, ..)?;

    Ok(())
}

fn fixture() -> (tempfile::TempDir, PathBuf) {
    let _ = env_logger::builder().is_test(true).try_init();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(GRANULE_NAME);
    write_granule(&path).unwrap();
    (dir, path)
}

#[test]
fn test_open_and_list_variables() {
    let (_dir, path) = fixture();
    let granule = Vnp21ImgNrtGranule::open(path.as_path()).unwrap();

    assert_eq!(granule.filename(), path.as_path());
    assert_eq!(granule.filename_base(), GRANULE_NAME);
    assert!(granule.hv().is_none());

    let mut variables = granule.variables().unwrap();
    variables.sort();
    assert_eq!(
        variables,
        vec!["Emis_I5", "Emis_I5_err", "LST", "LST_err", "QC", "View_angle"]
    );
}

#[test]
fn test_geometry_matches_layers() {
    let (_dir, path) = fixture();
    let mut granule = Vnp21ImgNrtGranule::open(path).unwrap();

    let geometry = granule.geometry().unwrap();
    assert_eq!(geometry.shape(), (ROWS, COLS));
    assert!(geometry.latitude()[[1, 3]].is_nan());
    assert_relative_eq!(geometry.longitude()[[2, 1]], -118.5);

    let bbox = geometry.bounding_box().unwrap();
    assert_relative_eq!(bbox.min_lat, 34.0);
    assert_relative_eq!(bbox.max_lat, 35.0);
    assert_relative_eq!(bbox.min_lon, -119.0);
    assert_relative_eq!(bbox.max_lon, -117.5);

    for layer in [
        granule.lst().unwrap(),
        granule.lst_err().unwrap(),
        granule.emis_i5().unwrap(),
        granule.emis_i5_err().unwrap(),
        granule.view_angle().unwrap(),
    ] {
        assert!(layer.matches_geometry());
    }
    assert!(granule.qc().unwrap().matches_geometry());
}

#[test]
fn test_dn_is_untouched() {
    let (_dir, path) = fixture();
    let mut granule = Vnp21ImgNrtGranule::open(path).unwrap();

    let dn = granule.dn("LST").unwrap();
    assert_eq!(dn.data()[[0, 0]], 15000.0);
    assert_eq!(dn.data()[[0, 2]], 0.0);
}

#[test]
fn test_lst_decoding() {
    let (_dir, path) = fixture();
    let mut granule = Vnp21ImgNrtGranule::open(path).unwrap();

    let lst = granule.lst().unwrap();
    assert_relative_eq!(lst.data()[[0, 0]], 300.0, epsilon = 1e-3);
    assert_relative_eq!(lst.data()[[1, 0]], 310.0, epsilon = 1e-3);
    assert!(lst.data()[[0, 2]].is_nan());
    assert!(lst.data()[[1, 3]].is_nan());
    assert_eq!(lst.valid_count(), 10);

    let st_k = granule.st_k().unwrap();
    let st_c = granule.st_c().unwrap();
    for (k, c) in st_k.data().iter().zip(st_c.data().iter()) {
        if k.is_nan() {
            assert!(c.is_nan());
        } else {
            assert_relative_eq!(*c, k - 273.15, epsilon = 1e-9);
        }
    }
}

#[test]
fn test_packing_attributes() {
    let (_dir, path) = fixture();
    let granule = Vnp21ImgNrtGranule::open(path).unwrap();

    assert_relative_eq!(granule.scale("LST").unwrap(), 0.02, epsilon = 1e-6);
    assert_relative_eq!(granule.offset("Emis_I5").unwrap(), 0.5, epsilon = 1e-6);
    assert_eq!(granule.fill("View_angle").unwrap(), 255.0);
    assert!(matches!(
        granule.scale("QC"),
        Err(Vnp21Error::MissingAttribute { .. })
    ));
}

#[test]
fn test_read_overrides() {
    let (_dir, path) = fixture();
    let mut granule = Vnp21ImgNrtGranule::open(path).unwrap();

    let raw_units = granule
        .read("LST", &ReadOptions::new().scale(1.0).offset(0.0))
        .unwrap();
    assert_eq!(raw_units.data()[[0, 0]], 15000.0);
    assert!(raw_units.data()[[0, 2]].is_nan());

    let refilled = granule
        .read("LST", &ReadOptions::new().fill(15000.0))
        .unwrap();
    assert!(refilled.data()[[0, 0]].is_nan());
    assert!(refilled.data()[[1, 1]].is_nan());
    // 0 is no longer fill
    assert_eq!(refilled.data()[[0, 2]], 0.0);

    let clipped = granule
        .read("LST", &ReadOptions::new().lower(295.0).upper(305.0))
        .unwrap();
    assert_relative_eq!(clipped.data()[[1, 0]], 305.0);
    assert_relative_eq!(clipped.data()[[0, 3]], 295.0);
    assert!(clipped.data()[[0, 2]].is_nan());
}

#[test]
fn test_emissivity_never_above_one() {
    let (_dir, path) = fixture();
    let mut granule = Vnp21ImgNrtGranule::open(path).unwrap();

    let emis = granule.emis_i5().unwrap();
    assert!(emis.data().iter().filter(|v| !v.is_nan()).all(|&v| v <= 1.0));
    assert_relative_eq!(emis.data()[[0, 1]], 1.0);
    assert_relative_eq!(emis.data()[[0, 0]], 0.9, epsilon = 1e-6);

    let unclipped = granule.read("Emis_I5", &ReadOptions::default()).unwrap();
    assert!(unclipped.data()[[0, 1]] > 1.0);
}

#[test]
fn test_cloud_mask_and_masked_read() {
    let (_dir, path) = fixture();
    let mut granule = Vnp21ImgNrtGranule::open(path).unwrap();

    let cloud = granule.cloud().unwrap();
    let expected = [
        [false, true, false, true],
        [true, false, false, false],
        [false, false, false, true],
    ];
    for row in 0..ROWS {
        for col in 0..COLS {
            assert_eq!(cloud.data()[[row, col]], expected[row][col], "pixel ({}, {})", row, col);
        }
    }

    let masked = granule
        .read("LST", &ReadOptions::new().apply_cloud(true))
        .unwrap();
    for ((&is_cloud, &value), &dn) in cloud.data().iter().zip(masked.data().iter()).zip(LST.iter()) {
        if is_cloud || dn == 0 {
            assert!(value.is_nan());
        } else {
            assert!(!value.is_nan());
        }
    }
}

#[test]
fn test_missing_variable() {
    let (_dir, path) = fixture();
    let mut granule = Vnp21ImgNrtGranule::open(path).unwrap();

    assert!(matches!(
        granule.read("Cloud_Mask", &ReadOptions::default()),
        Err(Vnp21Error::MissingVariable { .. })
    ));
    assert!(matches!(
        granule.dn("Cloud_Mask"),
        Err(Vnp21Error::MissingVariable { .. })
    ));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let granule = Vnp21ImgNrtGranule::open(dir.path().join(GRANULE_NAME)).unwrap();

    assert!(granule.variables().is_err());
}
