use clap::ValueEnum;
use wordplay_protocol::Difficulty;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub(crate) enum DifficultyFlag {
    Easy,
    Hard,
}

impl DifficultyFlag {
    pub(crate) const fn as_domain(self) -> Difficulty {
        match self {
            DifficultyFlag::Easy => Difficulty::Easy,
            DifficultyFlag::Hard => Difficulty::Hard,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum ModeFlag {
    Shrinker,
    Mashup,
}
