pub mod commands;

pub use commands::MenuChoice;

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    str::FromStr,
};

use log::{debug, error};

use crate::storage::{Error, Record, Result, Store};

/// Starts an interactive menu session on stdin/stdout over the store at `path`
pub fn start_menu(path: PathBuf) -> io::Result<()> {
    let stdin = io::stdin().lock();
    let stdout = io::stdout();

    Session::new(Store::new(path), stdin, stdout).run()
}

/// One interactive session: reads menu choices from `input` and writes everything the user
/// sees to `output`.
pub struct Session<R, W> {
    store: Store,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(store: Store, input: R, output: W) -> Self {
        Self {
            store,
            input,
            output,
        }
    }

    /// Runs the menu loop until the user exits or the input is exhausted.
    ///
    /// Failed operations are reported and the menu is shown again; only a broken terminal
    /// ends the loop with an error.
    pub fn run(&mut self) -> io::Result<()> {
        debug!("starting session on {}", self.store.path().display());

        loop {
            self.print_menu()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                break;
            }

            match MenuChoice::try_from(line.as_str()) {
                Ok(MenuChoice::Exit) => break,
                Ok(choice) => {
                    if let Err(err) = self.execute(choice) {
                        error!("{choice:?} failed: {err}");
                        writeln!(self.output, "Error: {err}")?;
                    }
                }
                Err(msg) => writeln!(self.output, "{msg}")?,
            }
        }

        writeln!(self.output, "Exiting the program.")?;
        self.output.flush()
    }

    pub fn execute(&mut self, choice: MenuChoice) -> Result<()> {
        match choice {
            MenuChoice::AddRecord => self.add_record(),
            MenuChoice::DisplayMatching => self.display_matching(),
            MenuChoice::ChangeRecord => self.change_record(),
            MenuChoice::DisplayAll => self.display_all(),
            MenuChoice::Report => self.report(),
            MenuChoice::Exit => Ok(()),
        }
    }

    fn print_menu(&mut self) -> io::Result<()> {
        writeln!(self.output, "Menu:")?;
        for choice in MenuChoice::ALL {
            writeln!(self.output, "{}. {}", choice.number(), choice.label())?;
        }
        write!(self.output, "Enter your choice: ")?;
        self.output.flush()
    }

    fn add_record(&mut self) -> Result<()> {
        let record = read_record(&mut self.input, &mut self.output)?;
        self.store.append(&record)?;

        writeln!(self.output, "Record added successfully.")?;
        Ok(())
    }

    fn display_matching(&mut self) -> Result<()> {
        let needle = prompt(
            &mut self.input,
            &mut self.output,
            "Enter the name or first few letters of the item: ",
        )?;

        let mut found = false;
        for record in self.store.search(&needle)? {
            let record = record?;
            writeln!(self.output, "Item Name: {}", record.name)?;
            writeln!(self.output, "Quantity on Hand: {}", record.quantity)?;
            writeln!(self.output, "Wholesale Cost: ${:.2}", record.wholesale)?;
            writeln!(self.output, "Retail Cost: ${:.2}", record.retail)?;
            writeln!(self.output, "------------------------")?;
            found = true;
        }

        if !found {
            writeln!(self.output, "No matching records found.")?;
        }
        Ok(())
    }

    fn change_record(&mut self) -> Result<()> {
        let name = prompt(
            &mut self.input,
            &mut self.output,
            "Enter the name of the item to change: ",
        )?;
        let name = name.trim();

        let Self {
            store,
            input,
            output,
        } = &mut *self;
        let replaced = store.update(name, |_| {
            writeln!(output, "Enter the new record:")?;
            read_record(&mut *input, &mut *output)
        })?;

        if replaced == 0 {
            writeln!(
                self.output,
                "No matching record found for the item name: {name}"
            )?;
        } else {
            writeln!(self.output, "Record changed successfully.")?;
        }
        Ok(())
    }

    fn display_all(&mut self) -> Result<()> {
        let records = self.store.records()?;

        writeln!(
            self.output,
            "{:<20}{:<20}{:<20}{:<20}",
            "Item Name", "Quantity on Hand", "Wholesale Cost", "Retail Cost"
        )?;
        writeln!(self.output, "{}", "-".repeat(80))?;

        for record in records {
            let record = record?;
            writeln!(
                self.output,
                "{:<20}{:<20}{:<20}{:<20}",
                record.name,
                record.quantity,
                format!("${:.2}", record.wholesale),
                format!("${:.2}", record.retail),
            )?;
        }
        Ok(())
    }

    fn report(&mut self) -> Result<()> {
        let totals = self.store.report()?;

        writeln!(self.output, "Report:")?;
        writeln!(
            self.output,
            "a. Total Wholesale Value of Inventory: ${:.2}",
            totals.wholesale
        )?;
        writeln!(
            self.output,
            "b. Total Retail Value of Inventory: ${:.2}",
            totals.retail
        )?;
        writeln!(
            self.output,
            "c. Total Quantity of All Items in the Inventory: {}",
            totals.quantity
        )?;
        Ok(())
    }
}

/// Prints `message` and reads one line of input, without its line ending
fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, message: &str) -> Result<String> {
    write!(output, "{message}")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(Error::InvalidInput("unexpected end of input".into()));
    }

    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn prompt_number<T, R, W>(input: &mut R, output: &mut W, message: &str, field: &str) -> Result<T>
where
    T: FromStr,
    R: BufRead,
    W: Write,
{
    let text = prompt(input, output, message)?;
    let text = text.trim();
    text.parse()
        .map_err(|_| Error::InvalidInput(format!("`{text}` is not a valid {field}")))
}

/// Prompts for the four fields of a record and validates them
fn read_record<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Record> {
    let name = prompt(input, output, "Enter item name: ")?;
    let quantity = prompt_number(input, output, "Enter quantity on hand: ", "quantity")?;
    let wholesale = prompt_number(input, output, "Enter wholesale cost: ", "wholesale cost")?;
    let retail = prompt_number(input, output, "Enter retail cost: ", "retail cost")?;

    Record::new(name.trim(), quantity, wholesale, retail)
}
