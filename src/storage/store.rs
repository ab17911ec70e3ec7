use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use tempfile::NamedTempFile;

use super::{
    error::{Error, Result},
    record::Record,
    report::Totals,
};

/// Store used when no other file is given.
pub const DEFAULT_STORE: &str = "inventory.txt";

/// Flat text file holding one record per line.
///
/// Nothing is cached in memory; each operation opens the file, streams it and closes it
/// again before returning.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a record to the end of the store, creating the file if needed.
    ///
    /// The record is validated first; a rejected record leaves the file untouched.
    pub fn append(&self, record: &Record) -> Result<()> {
        record.validate()?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::unavailable(&self.path, e))?;

        if !ends_with_newline(&mut file)? {
            writeln!(file)?;
        }
        writeln!(file, "{record}")?;
        file.sync_data()?;

        debug!("appended `{}` to {}", record.name, self.path.display());
        Ok(())
    }

    /// Streams every record in file order
    pub fn records(&self) -> Result<Records<BufReader<File>>> {
        let file = File::open(&self.path).map_err(|e| Error::unavailable(&self.path, e))?;
        Ok(Records::new(BufReader::new(file)))
    }

    /// Streams the records whose name contains `needle`.
    ///
    /// Matching is case-sensitive; an empty needle matches every record.
    pub fn search<'a>(
        &self,
        needle: &'a str,
    ) -> Result<impl Iterator<Item = Result<Record>> + 'a> {
        debug!("searching {} for `{needle}`", self.path.display());
        Ok(self.records()?.filter(move |record| match record {
            Ok(record) => record.name.contains(needle),
            Err(_) => true,
        }))
    }

    /// Rewrites every record named exactly `name` with the record `replace` returns for it.
    ///
    /// The new contents are staged in a scratch file next to the store and renamed over it
    /// in one step once the whole pass succeeded. If `replace` fails, or nothing matched,
    /// the scratch file is discarded and the store is left as it was. Returns the number
    /// of records replaced.
    pub fn update<F>(&self, name: &str, mut replace: F) -> Result<usize>
    where
        F: FnMut(&Record) -> Result<Record>,
    {
        let file = File::open(&self.path).map_err(|e| Error::unavailable(&self.path, e))?;
        let permissions = file.metadata()?.permissions();

        let dir = self.directory();
        let scratch = NamedTempFile::new_in(dir).map_err(|e| Error::unavailable(dir, e))?;
        let mut writer = BufWriter::new(scratch);
        let mut replaced = 0;

        let mut reader = BufReader::new(file);
        let mut line = Vec::new();
        let mut line_num = 0;
        while read_line(&mut reader, &mut line)? {
            line_num += 1;
            match decode(&line) {
                Ok(record) if record.name == name => {
                    let replacement = replace(&record)?;
                    replacement.validate()?;
                    writeln!(writer, "{replacement}")?;
                    replaced += 1;
                    continue;
                }
                Ok(_) => {}
                Err(err) if !is_blank(&line) => {
                    warn!("copying line {line_num} unchanged: {err}");
                }
                Err(_) => {}
            }
            writer.write_all(&line)?;
            writer.write_all(b"\n")?;
        }

        if replaced == 0 {
            debug!("no record named `{name}` in {}", self.path.display());
            return Ok(0);
        }

        let scratch = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        scratch.as_file().sync_all()?;
        fs::set_permissions(scratch.path(), permissions)?;
        scratch
            .persist(&self.path)
            .map_err(|e| Error::SwapFailed(e.error))?;

        info!(
            "replaced {replaced} record(s) named `{name}` in {}",
            self.path.display()
        );
        Ok(replaced)
    }

    /// Sums stock values and quantities over the whole store
    pub fn report(&self) -> Result<Totals> {
        let mut totals = Totals::default();
        for record in self.records()? {
            totals.add(&record?);
        }

        debug!("report over {}: {totals:?}", self.path.display());
        Ok(totals)
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(DEFAULT_STORE)
    }
}

fn ends_with_newline(file: &mut File) -> Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Reads the next line into `buf` without its `\n`; returns `false` at end of file.
///
/// Lines are kept as raw bytes so text in another encoding can still be copied around.
fn read_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<bool> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(false);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }

    Ok(true)
}

fn decode(line: &[u8]) -> Result<Record> {
    std::str::from_utf8(line)
        .map_err(|e| Error::MalformedRecord(format!("not valid UTF-8 ({e})")))?
        .parse()
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

/// Iterator over the records of a store.
///
/// Blank lines are ignored and lines that do not decode are skipped with a warning, so a
/// single bad line never hides the records after it.
pub struct Records<R> {
    reader: R,
    line: Vec<u8>,
    line_num: usize,
}

impl<R: BufRead> Records<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            line_num: 0,
        }
    }
}

impl<R: BufRead> Iterator for Records<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match read_line(&mut self.reader, &mut self.line) {
                Ok(true) => self.line_num += 1,
                Ok(false) => return None,
                Err(e) => return Some(Err(e.into())),
            }

            if is_blank(&self.line) {
                continue;
            }
            match decode(&self.line) {
                Ok(record) => return Some(Ok(record)),
                Err(err) => warn!("skipping line {}: {err}", self.line_num),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use tempfile::TempDir;

    use super::*;

    fn store_with(contents: impl AsRef<[u8]>) -> (TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.txt");
        fs::write(&path, contents).unwrap();
        (dir, Store::new(path))
    }

    fn names(records: impl Iterator<Item = Result<Record>>) -> Vec<String> {
        records.map(|r| r.unwrap().name).collect()
    }

    fn scratch_files(dir: &TempDir) -> usize {
        fs::read_dir(dir.path()).unwrap().count() - 1
    }

    #[test]
    fn append_creates_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("new.txt"));

        store.append(&Record::new("Widget", 10, 2.5, 5.0).unwrap()).unwrap();
        store.append(&Record::new("Gadget", 3, 1.0, 2.0).unwrap()).unwrap();

        let contents = fs::read_to_string(store.path()).unwrap();
        assert_eq!(contents, "Widget 10 2.5 5\nGadget 3 1 2\n");
    }

    #[test]
    fn append_starts_a_new_line() {
        let (_dir, store) = store_with("Widget 10 2.5 5");
        store.append(&Record::new("Gadget", 3, 1.0, 2.0).unwrap()).unwrap();

        let contents = fs::read_to_string(store.path()).unwrap();
        assert_eq!(contents, "Widget 10 2.5 5\nGadget 3 1 2\n");
    }

    #[test]
    fn rejected_append_leaves_store_untouched() {
        let (_dir, store) = store_with("Widget 10 2.50 5.00\n");
        let bad = Record {
            name: "Gadget".into(),
            quantity: 3,
            wholesale: -1.0,
            retail: 2.0,
        };

        assert!(matches!(store.append(&bad), Err(Error::InvalidInput(_))));
        assert_eq!(
            fs::read_to_string(store.path()).unwrap(),
            "Widget 10 2.50 5.00\n"
        );
    }

    #[test]
    fn missing_store_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("missing.txt"));

        assert!(matches!(store.records(), Err(Error::FileUnavailable { .. })));
        assert!(matches!(store.report(), Err(Error::FileUnavailable { .. })));
        assert!(matches!(
            store.update("Widget", |r| Ok(r.clone())),
            Err(Error::FileUnavailable { .. })
        ));
    }

    #[test]
    fn search_is_case_sensitive_substring() {
        let (_dir, store) = store_with("Widget 10 2.50 5.00\nGadget 3 1.00 2.00\n");

        assert_eq!(names(store.search("idg").unwrap()), ["Widget"]);
        assert_eq!(names(store.search("a").unwrap()), ["Gadget"]);
        assert!(names(store.search("widget").unwrap()).is_empty());
    }

    #[test]
    fn empty_search_matches_everything_in_order() {
        let (_dir, store) = store_with("Widget 10 2.50 5.00\nGadget 3 1.00 2.00\nWidget 1 1 1\n");
        assert_eq!(
            names(store.search("").unwrap()),
            ["Widget", "Gadget", "Widget"]
        );
    }

    #[test]
    fn records_skip_malformed_lines() {
        let input = Cursor::new("Widget 10 2.50 5.00\n\nbroken line\nGadget 3 1.00 2.00\n");
        assert_eq!(names(Records::new(input)), ["Widget", "Gadget"]);
    }

    #[test]
    fn report_totals() {
        let (_dir, store) = store_with("Widget 10 2.50 5.00\n");
        let totals = store.report().unwrap();

        assert_eq!(totals.wholesale, 25.0);
        assert_eq!(totals.retail, 50.0);
        assert_eq!(totals.quantity, 10);
    }

    #[test]
    fn report_on_empty_store() {
        let (_dir, store) = store_with("");
        assert_eq!(store.report().unwrap(), Totals::default());
    }

    #[test]
    fn update_replaces_in_place() {
        let (dir, store) = store_with("Widget 10 2.50 5.00\nGadget 3 1.00 2.00\n");

        let replaced = store
            .update("Widget", |_| Record::new("SuperWidget", 5, 3.0, 6.0))
            .unwrap();

        assert_eq!(replaced, 1);
        assert_eq!(
            fs::read_to_string(store.path()).unwrap(),
            "SuperWidget 5 3 6\nGadget 3 1.00 2.00\n"
        );
        assert_eq!(scratch_files(&dir), 0);
    }

    #[test]
    fn update_matches_exact_names_only() {
        let (_dir, store) = store_with("Widget 10 2.50 5.00\nWidgets 1 1 1\nGadget 3 1.00 2.00\n");

        store
            .update("Widget", |_| Record::new("Sprocket", 1, 1.0, 1.0))
            .unwrap();

        assert_eq!(
            names(store.records().unwrap()),
            ["Sprocket", "Widgets", "Gadget"]
        );
    }

    #[test]
    fn update_replaces_every_match() {
        let (_dir, store) = store_with("Widget 1 1 1\nGadget 3 1.00 2.00\nWidget 2 2 2\n");
        let mut seen = Vec::new();

        let replaced = store
            .update("Widget", |old| {
                seen.push(old.quantity);
                Record::new(format!("Widget{}", old.quantity), old.quantity, 9.0, 9.0)
            })
            .unwrap();

        assert_eq!(replaced, 2);
        assert_eq!(seen, [1, 2]);
        assert_eq!(
            names(store.records().unwrap()),
            ["Widget1", "Gadget", "Widget2"]
        );
    }

    #[test]
    fn update_without_match_leaves_store_untouched() {
        let contents = "Widget 10 2.50 5.00\nGadget 3 1.00 2.00\n";
        let (dir, store) = store_with(contents);

        let replaced = store
            .update("Sprocket", |_| panic!("nothing should match"))
            .unwrap();

        assert_eq!(replaced, 0);
        assert_eq!(fs::read_to_string(store.path()).unwrap(), contents);
        assert_eq!(scratch_files(&dir), 0);
    }

    #[test]
    fn failed_replacement_aborts_the_rewrite() {
        let contents = "Widget 10 2.50 5.00\nGadget 3 1.00 2.00\n";
        let (dir, store) = store_with(contents);

        let result = store.update("Gadget", |_| Record::new("Gadget", -3, 1.0, 2.0));

        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), contents);
        assert_eq!(scratch_files(&dir), 0);
    }

    #[test]
    fn update_keeps_malformed_lines() {
        let (_dir, store) = store_with("Widget 10 2.50 5.00\nnot a record\nGadget 3 1.00 2.00\n");

        store
            .update("Gadget", |_| Record::new("Gadget", 4, 1.0, 2.0))
            .unwrap();

        assert_eq!(
            fs::read_to_string(store.path()).unwrap(),
            "Widget 10 2.50 5.00\nnot a record\nGadget 4 1 2\n"
        );
    }

    #[test]
    fn records_skip_lines_in_another_encoding() {
        let (_dir, store) = store_with(b"Widget 10 2.50 5.00\nCaf\xe9 1 1 1\nGadget 3 1.00 2.00\n");

        assert_eq!(names(store.records().unwrap()), ["Widget", "Gadget"]);
        assert_eq!(names(store.search("").unwrap()), ["Widget", "Gadget"]);
        assert_eq!(store.report().unwrap().quantity, 13);
    }

    #[test]
    fn update_copies_lines_in_another_encoding() {
        let (_dir, store) = store_with(b"Widget 10 2.50 5.00\nCaf\xe9 1 1 1\nGadget 3 1.00 2.00\n");

        store
            .update("Gadget", |_| Record::new("Gadget", 4, 1.0, 2.0))
            .unwrap();

        assert_eq!(
            fs::read(store.path()).unwrap(),
            b"Widget 10 2.50 5.00\nCaf\xe9 1 1 1\nGadget 4 1 2\n"
        );
    }

    #[test]
    fn update_keeps_record_count_around_blank_lines() {
        let (_dir, store) = store_with("Widget 10 2.50 5.00\n\nGadget 3 1.00 2.00\n");
        let before = store.records().unwrap().count();

        store
            .update("Widget", |_| Record::new("SuperWidget", 5, 3.0, 6.0))
            .unwrap();

        assert_eq!(store.records().unwrap().count(), before);
        assert_eq!(
            fs::read_to_string(store.path()).unwrap(),
            "SuperWidget 5 3 6\n\nGadget 3 1.00 2.00\n"
        );
    }

    #[test]
    fn report_sums_quantities_past_i64() {
        let (_dir, store) = store_with("A 9223372036854775807 1 1\nB 1 1 1\n");
        let totals = store.report().unwrap();

        assert_eq!(totals.quantity, i128::from(i64::MAX) + 1);
    }
}
