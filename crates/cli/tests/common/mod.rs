// Shared fixtures: a small PEDE workbook and a settings file in a temp dir.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use rust_xlsxwriter::Workbook;
use tempfile::TempDir;

#[derive(Clone, Copy)]
pub enum Cell<'a> {
    S(&'a str),
    N(f64),
    Blank,
}

pub struct Sandbox {
    pub dir: TempDir,
}

impl Sandbox {
    /// Workbook with PEDE2022 and PEDE2023. `extra_2022` appends one column
    /// to the 2022 sheet with the same value in every row.
    pub fn new(extra_2022: Option<(&str, Cell)>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        write_workbook(&dir.path().join("PEDE.xlsx"), extra_2022);
        let config = format!(
            "years = [2022, 2023]\npairs = [[2022, 2023]]\ncontracts_dir = {:?}\nartifacts_dir = {:?}\n",
            dir.path().join("contracts").display().to_string(),
            dir.path().join("artifacts").display().to_string(),
        );
        std::fs::write(dir.path().join("cgrid.toml"), config).unwrap();
        Self { dir }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn cgrid(&self, args: &[&str]) -> Output {
        let config = self.path("cgrid.toml");
        let dataset = self.path("PEDE.xlsx");
        Command::new(env!("CARGO_BIN_EXE_cgrid"))
            .current_dir(self.dir.path())
            .env_remove("DATASET_PATH")
            .env("CGRID_LOG", "warn")
            .arg("--config")
            .arg(&config)
            .args(args)
            .arg("--dataset")
            .arg(&dataset)
            .output()
            .expect("run cgrid")
    }

    pub fn read_json(&self, rel: &str) -> serde_json::Value {
        let text = std::fs::read_to_string(self.path(rel)).unwrap_or_else(|e| panic!("{rel}: {e}"));
        serde_json::from_str(&text).unwrap()
    }
}

fn write_sheet(workbook: &mut Workbook, name: &str, headers: &[&str], rows: &[Vec<Cell>]) {
    let sheet = workbook.add_worksheet();
    sheet.set_name(name).unwrap();
    for (c, h) in headers.iter().enumerate() {
        sheet.write_string(0, c as u16, *h).unwrap();
    }
    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let (r, c) = (r as u32 + 1, c as u16);
            match cell {
                Cell::S(s) => {
                    sheet.write_string(r, c, *s).unwrap();
                }
                Cell::N(n) => {
                    sheet.write_number(r, c, *n).unwrap();
                }
                Cell::Blank => {}
            }
        }
    }
}

fn write_workbook(path: &Path, extra_2022: Option<(&str, Cell)>) {
    use Cell::*;
    let mut workbook = Workbook::new();

    let mut headers_2022 = vec!["RA", "Defas", "Idade 22", "Gênero", "Matem"];
    let mut rows_2022 = vec![
        vec![S("RA-1"), N(-1.0), N(12.0), S("Menina"), N(6.5)],
        vec![S("RA-2"), N(0.0), N(13.0), S("Menino"), N(4.0)],
        vec![S("RA-3"), N(1.0), N(9.0), S("Menina"), N(5.0)],
        vec![S("RA-4"), N(0.0), N(10.0), S("Menino"), N(9.0)],
    ];
    if let Some((name, cell)) = extra_2022 {
        headers_2022.push(name);
        for row in &mut rows_2022 {
            row.push(cell);
        }
    }
    write_sheet(&mut workbook, "PEDE2022", &headers_2022, &rows_2022);

    write_sheet(
        &mut workbook,
        "PEDE2023",
        &["RA", "Defasagem", "Idade", "Gênero", "Mat"],
        &[
            vec![S("RA-1"), N(-1.0), N(13.0), S("Feminino"), N(7.0)],
            vec![S("RA-2"), S("#N/A"), N(14.0), S("Masculino"), N(5.5)],
            vec![S("RA-3"), Blank, N(10.0), S("Feminino"), N(6.0)],
            vec![S("RA-4"), N(2.0), N(11.0), S("Masculino"), N(8.0)],
            vec![S("RA-9"), N(0.0), N(12.0), S("Feminino"), N(3.0)],
        ],
    );
    workbook.save(path).unwrap();
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
