/// Actions offered by the main menu.
///
/// Each choice is selected by typing its number at the menu prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    /// Append a new record to the store
    AddRecord,
    /// Show every record whose name contains some text
    DisplayMatching,
    /// Replace the records with an exact name
    ChangeRecord,
    /// Show the whole store as a table
    DisplayAll,
    /// Print the stock value and quantity totals
    Report,
    /// Close the session
    Exit,
}

impl MenuChoice {
    /// Menu entries in the order they are listed
    pub const ALL: [Self; 6] = [
        Self::AddRecord,
        Self::DisplayMatching,
        Self::ChangeRecord,
        Self::DisplayAll,
        Self::Report,
        Self::Exit,
    ];

    pub fn number(&self) -> u8 {
        match self {
            Self::AddRecord => 1,
            Self::DisplayMatching => 2,
            Self::ChangeRecord => 3,
            Self::DisplayAll => 4,
            Self::Report => 5,
            Self::Exit => 0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::AddRecord => "Add new record",
            Self::DisplayMatching => "Display specific record",
            Self::ChangeRecord => "Change a record",
            Self::DisplayAll => "Display all records",
            Self::Report => "Prepare a report",
            Self::Exit => "Exit",
        }
    }
}

impl TryFrom<&str> for MenuChoice {
    type Error = String;

    fn try_from(input: &str) -> Result<Self, Self::Error> {
        let input = input.trim();
        input
            .parse::<u8>()
            .ok()
            .and_then(|num| Self::ALL.into_iter().find(|choice| choice.number() == num))
            .ok_or_else(|| format!("Invalid choice `{input}`. Please enter a valid option."))
    }
}
