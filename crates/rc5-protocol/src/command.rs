//! Amplifier command table
//!
//! Codes understood by the Cambridge Audio azur series on system id 16.
//! Several codes (`bright`, `source+`, `source-`) sit in the extended range
//! above 63 and are encoded with the reduced start field.

use std::str::FromStr;

use crate::error::ProtocolError;

/// Amplifier command with a fixed RC-5 command code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AmpCommand {
    /// `vol-`
    VolumeDown,
    /// `vol+`
    VolumeUp,
    /// `mute` (amplifier-side toggle)
    Mute,
    /// `standby` (amplifier-side toggle)
    Standby,
    /// `bright` (display brightness)
    Bright,
    /// `source+`
    SourceNext,
    /// `source-`
    SourcePrevious,
    /// `clipoff`
    ClipOff,
    /// `clipon`
    ClipOn,
    /// `muteon` (discrete)
    MuteOn,
    /// `muteoff` (discrete)
    MuteOff,
    /// `ampon` (discrete power on)
    AmpOn,
    /// `ampoff` (discrete power off)
    AmpOff,
}

impl AmpCommand {
    /// Every command in the table
    pub const ALL: [AmpCommand; 13] = [
        AmpCommand::VolumeDown,
        AmpCommand::VolumeUp,
        AmpCommand::Mute,
        AmpCommand::Standby,
        AmpCommand::Bright,
        AmpCommand::SourceNext,
        AmpCommand::SourcePrevious,
        AmpCommand::ClipOff,
        AmpCommand::ClipOn,
        AmpCommand::MuteOn,
        AmpCommand::MuteOff,
        AmpCommand::AmpOn,
        AmpCommand::AmpOff,
    ];

    /// Symbolic name used in configuration and logs
    pub fn name(&self) -> &'static str {
        match self {
            AmpCommand::VolumeDown => "vol-",
            AmpCommand::VolumeUp => "vol+",
            AmpCommand::Mute => "mute",
            AmpCommand::Standby => "standby",
            AmpCommand::Bright => "bright",
            AmpCommand::SourceNext => "source+",
            AmpCommand::SourcePrevious => "source-",
            AmpCommand::ClipOff => "clipoff",
            AmpCommand::ClipOn => "clipon",
            AmpCommand::MuteOn => "muteon",
            AmpCommand::MuteOff => "muteoff",
            AmpCommand::AmpOn => "ampon",
            AmpCommand::AmpOff => "ampoff",
        }
    }

    /// RC-5 command code
    pub fn code(&self) -> u8 {
        match self {
            AmpCommand::VolumeDown => 17,
            AmpCommand::VolumeUp => 16,
            AmpCommand::Mute => 13,
            AmpCommand::Standby => 12,
            AmpCommand::Bright => 72,
            AmpCommand::SourceNext => 99,
            AmpCommand::SourcePrevious => 126,
            AmpCommand::ClipOff => 21,
            AmpCommand::ClipOn => 22,
            AmpCommand::MuteOn => 50,
            AmpCommand::MuteOff => 51,
            AmpCommand::AmpOn => 110,
            AmpCommand::AmpOff => 111,
        }
    }

    /// Look up a command by symbolic name
    pub fn from_name(name: &str) -> Result<Self, ProtocolError> {
        Self::ALL
            .into_iter()
            .find(|cmd| cmd.name() == name)
            .ok_or_else(|| ProtocolError::UnknownCommand(name.to_string()))
    }

    /// Find the command whose encoded command field matches `field`
    ///
    /// Extended codes are compared after masking, the way they appear on the
    /// wire, so `start` is needed to tell `source-` (126) from code 62.
    pub fn from_wire(start: u8, field: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|cmd| {
            let word = crate::ControlWord::encode(0, cmd.code());
            word.command() == field && word.start() == start
        })
    }
}

impl FromStr for AmpCommand {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl std::fmt::Display for AmpCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ControlWord;

    #[test]
    fn test_name_lookup() {
        assert_eq!(AmpCommand::from_name("vol+"), Ok(AmpCommand::VolumeUp));
        assert_eq!("ampoff".parse::<AmpCommand>(), Ok(AmpCommand::AmpOff));
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(
            AmpCommand::from_name("louder"),
            Err(ProtocolError::UnknownCommand("louder".into()))
        );
    }

    #[test]
    fn test_table_codes() {
        let table: Vec<(&str, u8)> = AmpCommand::ALL.iter().map(|c| (c.name(), c.code())).collect();
        assert_eq!(
            table,
            vec![
                ("vol-", 17),
                ("vol+", 16),
                ("mute", 13),
                ("standby", 12),
                ("bright", 72),
                ("source+", 99),
                ("source-", 126),
                ("clipoff", 21),
                ("clipon", 22),
                ("muteon", 50),
                ("muteoff", 51),
                ("ampon", 110),
                ("ampoff", 111),
            ]
        );
    }

    #[test]
    fn test_from_wire_identifies_every_command() {
        for cmd in AmpCommand::ALL {
            let word = ControlWord::encode(16, cmd.code());
            assert_eq!(AmpCommand::from_wire(word.start(), word.command()), Some(cmd));
        }
    }
}
