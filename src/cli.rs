use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "curls", version, about = "Workout session tracker")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Emit machine-readable JSON instead of colorful text.
    #[arg(global = true, long)]
    pub json: bool,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// The workout in progress
    #[command(subcommand, visible_alias = "s")]
    Session(SessionCmd),

    /// Exercise database
    #[command(subcommand, visible_alias = "ex")]
    Exercise(ExerciseCmd),

    /// Saved workout templates
    #[command(subcommand, visible_alias = "t")]
    Template(TemplateCmd),

    /// Completed workouts
    #[command(subcommand, visible_alias = "h")]
    History(HistoryCmd),

    /// Show completed workouts in a calendar view
    #[command(visible_alias = "cal")]
    Calendar {
        /// Year to show (defaults to current year)
        #[arg(short, long)]
        year: Option<i32>,

        /// Month to show (1-12, defaults to current month)
        #[arg(short, long)]
        month: Option<u32>,
    },

    /// View or edit curls config
    #[command(subcommand)]
    Config(ConfigCmd),
}

//
// Commands
//

#[derive(Subcommand)]
pub enum SessionCmd {
    /// Start a workout, optionally from a template
    #[command(visible_alias = "s")]
    Start {
        /// Template index (from `template list`)
        #[arg(short, long)]
        template: Option<usize>,

        /// Load renamed exercises under their suggested replacement
        #[arg(long, requires = "template")]
        accept_renames: bool,
    },

    /// Abandon the current workout without saving
    #[command(visible_alias = "c")]
    Cancel,

    /// Show the current workout
    #[command(visible_alias = "i")]
    Show,

    /// Save the completed sets to history and end the workout
    #[command(visible_alias = "f")]
    Finish {
        /// Also save the workout as a template with this name
        #[arg(long, value_name = "NAME")]
        save_template: Option<String>,

        /// Overwrite the template the workout was started from
        #[arg(long)]
        update_template: bool,
    },

    /// Add an exercise by id, name or search text
    #[command(visible_alias = "a", trailing_var_arg = true)]
    AddEx {
        #[arg(required = true)]
        exercise: Vec<String>,
    },

    /// Append an empty set to an exercise
    AddSet {
        /// Exercise index
        exercise: usize,
    },

    /// Edit a set - Usage: session edit EXERCISE SET [-w WEIGHT] [-r REPS]
    #[command(visible_alias = "e")]
    Edit {
        /// Exercise index
        exercise: usize,

        /// Set index
        set: usize,

        #[arg(short, long)]
        weight: Option<f64>,

        #[arg(short, long)]
        reps: Option<u32>,

        /// Only change this set, never the ones after it
        #[arg(long)]
        no_propagate: bool,
    },

    /// Mark a set completed (defaults to the next open set)
    #[command(visible_alias = "d")]
    Done {
        /// Exercise index
        exercise: usize,

        /// Set index
        set: Option<usize>,

        /// Mark the set as not completed instead
        #[arg(long, requires = "set")]
        undo: bool,
    },

    /// Delete a set (an exercise always keeps at least one)
    DelSet { exercise: usize, set: usize },

    /// Remove an exercise from the workout
    DelEx { exercise: usize },

    /// Move an exercise to another position
    #[command(visible_alias = "m")]
    Move { from: usize, to: usize },

    /// Set the workout notes, or an exercise's notes with --exercise
    #[command(visible_alias = "n")]
    Note {
        note: String,

        /// Exercise index
        #[arg(short, long)]
        exercise: Option<usize>,
    },

    /// Rename the workout
    Title { title: String },

    /// Show the elapsed time
    Timer {
        /// Keep updating every second until interrupted
        #[arg(short, long)]
        follow: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum ExerciseCmd {
    /// List all exercises
    #[command(visible_alias = "l")]
    List {
        /// Filter by muscle group
        #[arg(short, long)]
        muscle: Option<String>,
    },

    /// Search by name, muscle, category or equipment
    #[command(trailing_var_arg = true)]
    Search { query: Vec<String> },

    /// Show detailed exercise information
    #[command(visible_alias = "s", trailing_var_arg = true)]
    Show {
        /// Exercise id or name
        #[arg(required = true)]
        exercise: Vec<String>,
    },

    /// Add a custom exercise
    #[command(visible_alias = "a")]
    Add {
        /// Exercise name
        name: String,

        /// Primary muscle group (repeatable)
        #[arg(short, long, required = true)]
        muscle: Vec<String>,

        #[arg(short, long)]
        equipment: Option<String>,

        /// Exercise description
        #[arg(short, long)]
        desc: Option<String>,
    },

    /// Delete a custom exercise
    #[command(visible_alias = "d")]
    Delete {
        /// Exercise id or name
        exercise: String,
    },

    /// Closest catalog matches for a name
    #[command(trailing_var_arg = true)]
    Suggest {
        #[arg(required = true)]
        name: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum TemplateCmd {
    /// List templates
    #[command(visible_alias = "l")]
    List,

    /// Show a single template in detail
    #[command(visible_alias = "s")]
    Show { template: usize },

    /// Delete a template
    #[command(visible_alias = "d")]
    Delete { template: usize },

    /// Create an empty template
    #[command(visible_alias = "c")]
    Create {
        /// Defaults to "New Template"
        #[arg(default_value = "")]
        name: String,

        #[arg(short, long, default_value = "")]
        notes: String,
    },

    /// Copy a template under "<name> Copy"
    Duplicate { template: usize },

    /// Change a template's name, exercises or sets
    #[command(visible_alias = "e")]
    Edit {
        /// Template index
        template: usize,

        #[command(subcommand)]
        action: TemplateEditCmd,
    },

    /// Move a template to another position
    Move { from: usize, to: usize },

    /// Check templates against the exercise database
    #[command(visible_alias = "v")]
    Validate {
        /// Template index (defaults to all)
        template: Option<usize>,

        /// Apply the suggested replacements and drop missing exercises
        #[arg(long)]
        fix: bool,
    },

    /// Recreate the default templates
    Reset,
}

#[derive(Subcommand)]
pub enum TemplateEditCmd {
    Rename { name: String },

    /// Replace the notes (empty clears them)
    Notes { notes: String },

    /// Add an exercise by id, name or search text
    AddEx {
        #[arg(required = true)]
        exercise: Vec<String>,

        #[arg(short, long, default_value_t = 3)]
        sets: usize,

        #[arg(short, long, default_value_t = 0.0)]
        weight: f64,

        #[arg(short, long, default_value_t = 8)]
        reps: u32,
    },

    /// Remove an exercise
    DelEx { exercise: usize },

    /// Append a set (copies the last one unless given)
    AddSet {
        /// Exercise index
        exercise: usize,

        #[arg(short, long)]
        weight: Option<f64>,

        #[arg(short, long)]
        reps: Option<u32>,
    },

    /// Change a set's target weight or reps
    SetSet {
        /// Exercise index
        exercise: usize,

        /// Set index
        set: usize,

        #[arg(short, long)]
        weight: Option<f64>,

        #[arg(short, long)]
        reps: Option<u32>,
    },

    /// Delete a set (an exercise always keeps at least one)
    DelSet { exercise: usize, set: usize },
}

#[derive(Subcommand)]
pub enum HistoryCmd {
    /// List completed workouts, newest first
    #[command(visible_alias = "l")]
    List {
        /// Only workouts whose title, notes or exercises match
        #[arg(short, long)]
        search: Option<String>,

        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show a completed workout
    #[command(visible_alias = "s")]
    Show { workout: usize },

    /// Delete a completed workout
    #[command(visible_alias = "d")]
    Delete { workout: usize },
}

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Show all config keys
    List,

    /// Get the value of a key
    Get { key: String },

    /// Set or override a key
    Set { key: String, val: String },

    /// Remove a key
    Unset { key: String },
}
