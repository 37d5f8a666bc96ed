use std::fs::File;
use std::io;
use std::io::BufWriter;
use std::path::PathBuf;

/// Visualization sink: persists a named list of field arrays for one step of
/// a run. The file format is owned by the implementor; the driver only
/// supplies the labelled data, the basename, and the step/time stamps.
///
pub trait Visualization {
    fn write_dump(
        &mut self,
        basename: &str,
        step: u64,
        t: f64,
        fields: &[(String, &[f64])],
    ) -> io::Result<()>;
}

#[derive(serde::Serialize)]
struct Dump<'a> {
    step: u64,
    time: f64,
    fields: Vec<(&'a str, &'a [f64])>,
}

/// Writes each dump as a single CBOR document, `<basename>.cbor`, in a
/// target directory.
///
pub struct CborWriter {
    directory: PathBuf,
}

impl CborWriter {
    pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

impl Visualization for CborWriter {
    fn write_dump(
        &mut self,
        basename: &str,
        step: u64,
        t: f64,
        fields: &[(String, &[f64])],
    ) -> io::Result<()> {
        let dump = Dump {
            step,
            time: t,
            fields: fields.iter().map(|(name, data)| (name.as_str(), *data)).collect(),
        };
        let file = File::create(self.directory.join(format!("{}.cbor", basename)))?;
        let mut buffer = BufWriter::new(file);

        ciborium::ser::into_writer(&dump, &mut buffer)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
    }
}

#[cfg(test)]
mod test {

    use super::{CborWriter, Visualization};

    #[derive(serde::Deserialize)]
    struct Dump {
        step: u64,
        time: f64,
        fields: Vec<(String, Vec<f64>)>,
    }

    #[test]
    fn dumps_round_trip_through_cbor() {
        let dir = std::env::temp_dir().join(format!("cbor-writer-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let density = vec![1.0, 2.0, 3.0];
        let fields = vec![("density".to_string(), density.as_slice())];

        let mut writer = CborWriter::new(&dir);
        writer.write_dump("case-0000-0010", 10, 0.5, &fields).unwrap();

        let file = std::fs::File::open(dir.join("case-0000-0010.cbor")).unwrap();
        let dump: Dump = ciborium::de::from_reader(file).unwrap();

        assert_eq!(dump.step, 10);
        assert_eq!(dump.time, 0.5);
        assert_eq!(dump.fields[0].0, "density");
        assert_eq!(dump.fields[0].1, density);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn a_missing_directory_is_an_io_error() {
        let mut writer = CborWriter::new("/nonexistent-path/for-sure");
        assert!(writer.write_dump("case", 0, 0.0, &[]).is_err());
    }
}
