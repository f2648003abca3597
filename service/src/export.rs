//! Export of [`House`]s into a delimited text.

use std::string::FromUtf8Error;

use derive_more::{Display, Error as StdError, From};
use smart_default::SmartDefault;
use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator as _};
use tracerr::Traced;

use crate::domain::House;

/// Exported field of a [`House`].
#[derive(
    AsRefStr, Clone, Copy, Debug, EnumIter, EnumString, Eq, Hash, PartialEq,
)]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    /// ID of a [`House`].
    Id,

    /// Address of a [`House`].
    Address,

    /// Number of apartments in a [`House`].
    Apartments,

    /// Total area of a [`House`].
    TotalArea,

    /// Construction year of a [`House`].
    BuildYear,

    /// Number of floors in a [`House`].
    Floors,

    /// Age of a [`House`] in years.
    Age,
}

impl Field {
    /// Renders the value of this [`Field`] of the provided [`House`] as of
    /// the provided `year`.
    fn render(self, house: &House, year: i32) -> String {
        match self {
            Self::Id => house.id.to_string(),
            Self::Address => house.address.to_string(),
            Self::Apartments => house.apartments.to_string(),
            Self::TotalArea => house.total_area.get().normalize().to_string(),
            Self::BuildYear => house.build_year.to_string(),
            Self::Floors => house.floors.to_string(),
            Self::Age => house.age_in(year).to_string(),
        }
    }
}

/// Delimiter of exported fields.
#[derive(
    AsRefStr, Clone, Copy, Debug, Default, EnumString, Eq, Hash, PartialEq,
)]
#[strum(serialize_all = "snake_case")]
pub enum Delimiter {
    /// `\t` delimiter.
    #[default]
    Tab,

    /// `;` delimiter.
    Semicolon,

    /// `,` delimiter.
    Comma,
}

impl Delimiter {
    /// Returns the byte of this [`Delimiter`].
    #[must_use]
    pub const fn byte(self) -> u8 {
        match self {
            Self::Tab => b'\t',
            Self::Semicolon => b';',
            Self::Comma => b',',
        }
    }
}

/// Layout of an export.
#[derive(Clone, Debug, Eq, PartialEq, SmartDefault)]
pub struct Layout {
    /// [`Field`]s to export, in order.
    #[default(Field::iter().collect())]
    pub fields: Vec<Field>,

    /// [`Delimiter`] of the exported [`Field`]s.
    pub delimiter: Delimiter,

    /// Indicator whether a header row with [`Field`] names is exported.
    #[default(true)]
    pub header: bool,
}

/// Renders the provided [`House`]s according to the [`Layout`], calculating
/// their ages as of the provided `year`.
///
/// Values are quoted only when they contain the [`Delimiter`], a quote or a
/// line break.
///
/// # Errors
///
/// - If no [`Field`]s are selected in the [`Layout`].
/// - If there are no [`House`]s to export.
pub fn render(
    houses: &[House],
    layout: &Layout,
    year: i32,
) -> Result<String, Traced<Error>> {
    if layout.fields.is_empty() {
        return Err(tracerr::new!(Error::NoFields));
    }
    if houses.is_empty() {
        return Err(tracerr::new!(Error::NothingToExport));
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(layout.delimiter.byte())
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(vec![]);
    if layout.header {
        writer
            .write_record(layout.fields.iter().map(AsRef::<str>::as_ref))
            .map_err(tracerr::from_and_wrap!(=> Error))?;
    }
    for house in houses {
        writer
            .write_record(layout.fields.iter().map(|f| f.render(house, year)))
            .map_err(tracerr::from_and_wrap!(=> Error))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(csv::IntoInnerError::into_error)
        .map_err(tracerr::from_and_wrap!(=> Error))?;
    String::from_utf8(bytes).map_err(tracerr::from_and_wrap!(=> Error))
}

/// Error of [`House`]s export.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// [`csv`] writing error.
    #[display("Failed to write a record: {_0}")]
    Csv(csv::Error),

    /// Error of flushing the written records.
    #[display("Failed to flush records: {_0}")]
    Flush(std::io::Error),

    /// Written records are not a valid UTF-8.
    #[display("Records are not a valid UTF-8: {_0}")]
    Utf8(FromUtf8Error),

    /// No [`Field`]s selected for export.
    #[display("No fields selected for export")]
    NoFields,

    /// There are no [`House`]s to export.
    #[display("Nothing to export")]
    NothingToExport,
}

#[cfg(test)]
mod spec {
    use common::DateTime;
    use rust_decimal::Decimal;

    use crate::domain::{
        house::{Address, Apartments, BuildYear, Draft, Floors, Id, TotalArea},
        House,
    };

    use super::{render, Delimiter, Error, Field, Layout};

    fn house(id: i32, address: &str, total_area: Decimal) -> House {
        Draft {
            address: Address::new(address).unwrap(),
            apartments: Apartments::new(20).unwrap(),
            total_area: TotalArea::new(total_area).unwrap(),
            build_year: BuildYear::new(2000).unwrap(),
            floors: Floors::new(5).unwrap(),
        }
        .into_house(Id::from(id), DateTime::now().coerce())
    }

    #[test]
    fn renders_all_fields_by_default() {
        let houses = [house(1, "ул Ленина д5", Decimal::new(100_050, 2))];

        let text = render(&houses, &Layout::default(), 2024).unwrap();

        assert_eq!(
            text,
            "id\taddress\tapartments\ttotal_area\tbuild_year\tfloors\tage\n\
             1\tул Ленина д5\t20\t1000.5\t2000\t5\t24\n",
        );
    }

    #[test]
    fn renders_selected_fields_without_header() {
        let houses = [
            house(1, "ул Ленина д5", Decimal::from(1000)),
            house(2, "пр Мира 10", Decimal::new(7525, 1)),
        ];
        let layout = Layout {
            fields: vec![Field::TotalArea, Field::Id],
            delimiter: Delimiter::Semicolon,
            header: false,
        };

        let text = render(&houses, &layout, 2024).unwrap();

        assert_eq!(text, "1000;1\n752.5;2\n");
    }

    #[test]
    fn quotes_values_containing_delimiter() {
        let houses = [house(3, "ул. Ленина, д. 5", Decimal::ONE)];
        let layout = Layout {
            fields: vec![Field::Id, Field::Address],
            delimiter: Delimiter::Comma,
            header: true,
        };

        let text = render(&houses, &layout, 2024).unwrap();

        assert_eq!(text, "id,address\n3,\"ул. Ленина, д. 5\"\n");
    }

    #[test]
    fn refuses_to_export_nothing() {
        let err = render(&[], &Layout::default(), 2024).unwrap_err();

        assert!(matches!(err.as_ref(), Error::NothingToExport));
    }

    #[test]
    fn requires_fields() {
        let houses = [house(1, "ул Ленина д5", Decimal::ONE)];
        let layout = Layout {
            fields: vec![],
            ..Layout::default()
        };

        let err = render(&houses, &layout, 2024).unwrap_err();

        assert!(matches!(err.as_ref(), Error::NoFields));
    }

    #[test]
    fn parses_names() {
        assert_eq!("total_area".parse::<Field>(), Ok(Field::TotalArea));
        assert_eq!("comma".parse::<Delimiter>(), Ok(Delimiter::Comma));
        assert!("everything".parse::<Field>().is_err());
    }
}
