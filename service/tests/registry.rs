//! Registry scenarios executed against an in-memory [`Database`].

use std::sync::{Arc, Mutex};

use common::{
    operations::{
        By, Commit, Delete, Insert, Lock, Select, Transact, Update,
    },
    DateTime,
};
use futures::executor::block_on;
use rust_decimal::Decimal;
use secrecy::SecretBox;
use service::{
    command::{self, Command as _},
    domain::{
        house::{
            self, similarity::Score, Address, Apartments, BuildYear, Floors,
            TotalArea,
        },
        user::{self, Login, Password},
        House, User,
    },
    export,
    infra::{database, Database},
    query::{self, Query as _},
    read, Config, Service,
};
use tracerr::Traced;

/// [`Database`] keeping everything in memory.
///
/// Transactions are not isolated: every write is visible immediately.
#[derive(Clone, Debug, Default)]
struct Memory {
    houses: Arc<Mutex<Vec<House>>>,
    users: Arc<Mutex<Vec<User>>>,
    last_id: Arc<Mutex<i32>>,
}

impl Memory {
    fn next_id(&self) -> i32 {
        let mut id = self.last_id.lock().unwrap();
        *id += 1;
        *id
    }
}

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Lock<By<House, ()>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<House, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Lock<By<User, ()>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<User, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Lock<By<User, user::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<User, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Select<By<Vec<House>, ()>>> for Memory {
    type Ok = Vec<House>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<House>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.houses.lock().unwrap().clone())
    }
}

impl Database<Select<By<Option<House>, house::Id>>> for Memory {
    type Ok = Option<House>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<House>, house::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        let houses = self.houses.lock().unwrap();
        Ok(houses.iter().find(|h| h.id == id).cloned())
    }
}

impl Database<Insert<house::Draft>> for Memory {
    type Ok = House;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(draft): Insert<house::Draft>,
    ) -> Result<Self::Ok, Self::Err> {
        let house = draft
            .into_house(self.next_id().into(), DateTime::now().coerce());
        self.houses.lock().unwrap().push(house.clone());
        Ok(house)
    }
}

impl Database<Update<House>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(house): Update<House>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut houses = self.houses.lock().unwrap();
        if let Some(h) = houses.iter_mut().find(|h| h.id == house.id) {
            *h = house;
        }
        Ok(())
    }
}

impl Database<Delete<By<House, house::Id>>> for Memory {
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<House, house::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        let mut houses = self.houses.lock().unwrap();
        let before = houses.len();
        houses.retain(|h| h.id != id);
        Ok(u64::try_from(before - houses.len()).unwrap())
    }
}

impl Database<Delete<By<House, house::Criterion>>> for Memory {
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<House, house::Criterion>>,
    ) -> Result<Self::Ok, Self::Err> {
        let criterion = by.into_inner();
        let mut houses = self.houses.lock().unwrap();
        let before = houses.len();
        houses.retain(|h| !criterion.matches(h));
        Ok(u64::try_from(before - houses.len()).unwrap())
    }
}

impl Database<Select<By<Option<User>, user::Id>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }
}

impl<'l> Database<Select<By<Option<User>, &'l Login>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l Login>>,
    ) -> Result<Self::Ok, Self::Err> {
        let login = by.into_inner();
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| &u.login == login).cloned())
    }
}

impl Database<Insert<user::Draft>> for Memory {
    type Ok = User;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(draft): Insert<user::Draft>,
    ) -> Result<Self::Ok, Self::Err> {
        let user::Draft {
            login,
            password_hash,
            salt,
        } = draft;
        let user = User {
            id: self.next_id().into(),
            login,
            password_hash,
            salt,
            created_at: DateTime::now().coerce(),
        };
        self.users.lock().unwrap().push(user.clone());
        Ok(user)
    }
}

impl Database<Update<User>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(user): Update<User>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut users = self.users.lock().unwrap();
        if let Some(u) = users.iter_mut().find(|u| u.id == user.id) {
            *u = user;
        }
        Ok(())
    }
}

fn service() -> Service<Memory> {
    let secret = b"registry-test-secret";
    Service::new(
        Config {
            jwt_encoding_key: jsonwebtoken::EncodingKey::from_secret(secret),
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(secret),
            similarity_threshold: Score::WARNING_THRESHOLD,
        },
        Memory::default(),
    )
}

fn draft(address: &str, build_year: i32) -> house::Draft {
    house::Draft {
        address: Address::new(address).unwrap(),
        apartments: Apartments::new(20).unwrap(),
        total_area: TotalArea::new(Decimal::from(1000)).unwrap(),
        build_year: BuildYear::new(build_year).unwrap(),
        floors: Floors::new(5).unwrap(),
    }
}

fn create(service: &Service<Memory>, draft: house::Draft) -> House {
    block_on(service.execute(command::CreateHouse {
        house: draft,
        allow_similar: false,
    }))
    .unwrap()
}

fn secret(password: &str) -> SecretBox<Password> {
    SecretBox::new(Box::new(Password::new(password).unwrap()))
}

#[test]
fn registers_distinct_houses() {
    let service = service();

    let first = create(&service, draft("ул Ленина д5", 2000));
    let second = create(&service, draft("пр Мира 10", 1960));

    assert_ne!(first.id, second.id);
    let all = block_on(service.execute(query::houses::All::by(()))).unwrap();
    assert_eq!(
        all.iter().map(|h| h.id).collect::<Vec<_>>(),
        [first.id, second.id],
    );
    let listed = block_on(
        service.execute(query::houses::List {
            selector: read::house::list::Selector::default(),
        }),
    )
    .unwrap();
    assert_eq!(listed.len(), 2);
}

#[test]
fn rejects_same_normalized_address() {
    let service = service();
    _ = create(&service, draft("ул Ленина д5", 2000));

    let err = block_on(service.execute(command::CreateHouse {
        house: draft("улица  Ленина, д5", 1950),
        allow_similar: true,
    }))
    .unwrap_err();

    assert!(
        matches!(
            err.as_ref(),
            command::create_house::ExecutionError::AddressOccupied(_),
        ),
        "unexpected error: {err}",
    );
}

#[test]
fn rejects_similar_unless_allowed() {
    let service = service();
    let existing = create(&service, draft("ул Ленина д5", 2000));

    let err = block_on(service.execute(command::CreateHouse {
        house: draft("Ленина д5", 2002),
        allow_similar: false,
    }))
    .unwrap_err();
    let command::create_house::ExecutionError::SimilarExist(similar) =
        err.as_ref()
    else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(similar.len(), 1);
    assert_eq!(similar[0].house.id, existing.id);
    assert_eq!(
        similar[0].similarity.score,
        Score::new(Decimal::new(7, 1)).unwrap(),
    );

    let created = block_on(service.execute(command::CreateHouse {
        house: draft("Ленина д5", 2002),
        allow_similar: true,
    }))
    .unwrap();
    assert_ne!(created.id, existing.id);
}

#[test]
fn reports_duplicates_without_saving() {
    let service = service();
    _ = create(&service, draft("ул Ленина д5", 2000));

    let duplicates = block_on(service.execute(query::houses::Duplicates {
        house: draft("ул Ленина д5", 2001),
        id: None,
        threshold: None,
    }))
    .unwrap();

    assert!(duplicates.exact);
    assert_eq!(duplicates.similar.len(), 1);
    let houses = block_on(service.execute(query::houses::List {
        selector: read::house::list::Selector::default(),
    }))
    .unwrap();
    assert_eq!(houses.len(), 1);
}

#[test]
fn respects_explicit_threshold() {
    let service = service();
    _ = create(&service, draft("ул Ленина д5", 2000));

    let duplicates = block_on(service.execute(query::houses::Duplicates {
        house: draft("Ленина д5", 2000),
        id: None,
        threshold: Some(Score::DEFAULT_THRESHOLD),
    }))
    .unwrap();

    assert!(!duplicates.exact);
    assert!(duplicates.similar.is_empty());
}

#[test]
fn looks_up_similar_strictly_by_default() {
    let service = service();
    let house = create(&service, draft("ул Ленина д5", 2000));

    let lookup = |address, threshold| {
        block_on(service.execute(query::houses::Similar {
            house: draft(address, 2001),
            id: None,
            threshold,
        }))
        .unwrap()
    };

    let similar = lookup("ул Ленина д5", None);
    assert_eq!(similar.len(), 1);
    assert_eq!(similar[0].house.id, house.id);
    assert!(similar[0].similarity.score >= Score::DEFAULT_THRESHOLD);
    assert!(lookup("Ленина д5", None).is_empty());
    assert_eq!(lookup("Ленина д5", Some(Score::WARNING_THRESHOLD)).len(), 1);
}

#[test]
fn never_finds_house_similar_to_itself() {
    let service = service();
    let house = create(&service, draft("ул Ленина д5", 2000));

    let similar = block_on(service.execute(query::houses::Similar {
        house: draft("ул Ленина д5", 2000),
        id: Some(house.id),
        threshold: None,
    }))
    .unwrap();

    assert!(similar.is_empty());
}

#[test]
fn does_not_conflict_with_itself() {
    let service = service();
    let house = create(&service, draft("ул Ленина д5", 2000));

    let updated = block_on(service.execute(command::UpdateHouse {
        id: house.id,
        house: draft("улица Ленина, д5", 2001),
        allow_similar: false,
    }))
    .unwrap();

    assert_eq!(updated.id, house.id);
    assert_eq!(updated.created_at, house.created_at);
    assert_eq!(updated.build_year.get(), 2001);
    assert_eq!(AsRef::<str>::as_ref(&updated.address), "улица Ленина, д5");
}

#[test]
fn rejects_address_of_another_house() {
    let service = service();
    _ = create(&service, draft("ул Ленина д5", 2000));
    let other = create(&service, draft("пр Мира 10", 1960));

    let err = block_on(service.execute(command::UpdateHouse {
        id: other.id,
        house: draft("ул. Ленина д5", 1960),
        allow_similar: true,
    }))
    .unwrap_err();

    assert!(
        matches!(
            err.as_ref(),
            command::update_house::ExecutionError::AddressOccupied(_),
        ),
        "unexpected error: {err}",
    );
}

#[test]
fn fails_for_unknown_house() {
    let service = service();

    let err = block_on(service.execute(command::UpdateHouse {
        id: house::Id::from(42),
        house: draft("ул Ленина д5", 2000),
        allow_similar: false,
    }))
    .unwrap_err();

    assert!(
        matches!(
            err.as_ref(),
            command::update_house::ExecutionError::HouseNotExists(_),
        ),
        "unexpected error: {err}",
    );
}

#[test]
fn deletes_single_house() {
    let service = service();
    let house = create(&service, draft("ул Ленина д5", 2000));

    block_on(service.execute(command::DeleteHouse { id: house.id }))
        .unwrap();
    let err =
        block_on(service.execute(command::DeleteHouse { id: house.id }))
            .unwrap_err();

    assert!(matches!(
        err.as_ref(),
        command::delete_house::ExecutionError::HouseNotExists(_),
    ));
}

#[test]
fn deletes_by_criterion() {
    let service = service();
    _ = create(&service, draft("ул Ленина д5", 2000));
    _ = create(&service, draft("пр Мира 10", 1960));
    _ = create(&service, draft("ул Ленина д7", 1985));

    let deleted = block_on(service.execute(command::DeleteHouses {
        criterion: house::Criterion::Address(
            house::address::Fragment::new("ленина").unwrap(),
        ),
    }))
    .unwrap();

    assert_eq!(deleted, 2);
    let left = block_on(service.execute(query::houses::List {
        selector: read::house::list::Selector::default(),
    }))
    .unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(AsRef::<str>::as_ref(&left[0].address), "пр Мира 10");
}

#[test]
fn deletes_nothing_when_nothing_matches() {
    let service = service();
    _ = create(&service, draft("ул Ленина д5", 2000));

    let deleted = block_on(service.execute(command::DeleteHouses {
        criterion: house::Criterion::BuildYear(1900),
    }))
    .unwrap();

    assert_eq!(deleted, 0);
}

#[test]
fn exports_selected_fields() {
    let service = service();
    _ = create(&service, draft("ул Ленина д5", 2000));
    _ = create(&service, draft("пр Мира 10", 1960));

    let text = block_on(service.execute(query::houses::Export {
        selector: read::house::list::Selector::default(),
        layout: export::Layout {
            fields: vec![export::Field::Address, export::Field::BuildYear],
            delimiter: export::Delimiter::Semicolon,
            header: true,
        },
    }))
    .unwrap();

    assert_eq!(
        text,
        "address;build_year\nул Ленина д5;2000\nпр Мира 10;1960\n",
    );
}

#[test]
fn exports_houses_beyond_default_filter_bounds() {
    let service = service();
    _ = create(
        &service,
        house::Draft {
            apartments: Apartments::new(2500).unwrap(),
            total_area: TotalArea::new(Decimal::from(150_000)).unwrap(),
            ..draft("пр Мира 1", 1980)
        },
    );

    let text = block_on(service.execute(query::houses::Export {
        selector: read::house::list::Selector::default(),
        layout: export::Layout {
            fields: vec![export::Field::Apartments, export::Field::TotalArea],
            delimiter: export::Delimiter::Comma,
            header: false,
        },
    }))
    .unwrap();

    assert_eq!(text, "2500,150000\n");
}

#[test]
fn refuses_to_export_nothing() {
    let service = service();

    let err = block_on(service.execute(query::houses::Export {
        selector: read::house::list::Selector::default(),
        layout: export::Layout::default(),
    }))
    .unwrap_err();

    assert!(matches!(
        err.as_ref(),
        query::houses::export::ExecutionError::Export(
            export::Error::NothingToExport,
        ),
    ));
}

fn register(service: &Service<Memory>, login: &str, password: &str) {
    _ = block_on(service.execute(command::CreateUser {
        login: Login::new(login).unwrap(),
        password: secret(password),
    }))
    .unwrap();
}

#[test]
fn registers_and_signs_in() {
    let service = service();
    register(&service, "operator", "Secret#123");

    let output =
        block_on(service.execute(command::CreateUserSession::ByCredentials {
            login: Login::new("operator").unwrap(),
            password: secret("Secret#123"),
        }))
        .unwrap();
    let session = block_on(service.execute(
        command::AuthorizeUserSession {
            token: output.token,
        },
    ))
    .unwrap();

    assert_eq!(session.user_id, output.user.id);
}

#[test]
fn rejects_occupied_login() {
    let service = service();
    register(&service, "operator", "Secret#123");

    let err = block_on(service.execute(command::CreateUser {
        login: Login::new("operator").unwrap(),
        password: secret("Another#456"),
    }))
    .unwrap_err();

    assert!(matches!(
        err.as_ref(),
        command::create_user::ExecutionError::LoginOccupied(_),
    ));
}

#[test]
fn rejects_short_login_and_weak_password() {
    let service = service();

    let short = block_on(service.execute(command::CreateUser {
        login: Login::new("op").unwrap(),
        password: secret("Secret#123"),
    }))
    .unwrap_err();
    let weak = block_on(service.execute(command::CreateUser {
        login: Login::new("operator").unwrap(),
        password: secret("password"),
    }))
    .unwrap_err();

    assert!(matches!(
        short.as_ref(),
        command::create_user::ExecutionError::LoginTooShort,
    ));
    assert!(matches!(
        weak.as_ref(),
        command::create_user::ExecutionError::WeakPassword,
    ));
}

#[test]
fn rejects_wrong_credentials() {
    let service = service();
    register(&service, "operator", "Secret#123");

    let err =
        block_on(service.execute(command::CreateUserSession::ByCredentials {
            login: Login::new("operator").unwrap(),
            password: secret("Wrong#1234"),
        }))
        .unwrap_err();

    assert!(matches!(
        err.as_ref(),
        command::create_user_session::ExecutionError::WrongCredentials,
    ));
}

#[test]
fn updates_password() {
    let service = service();
    register(&service, "operator", "Secret#123");
    let user = block_on(
        service.execute(query::user::ByLogin::by(
            &Login::new("operator").unwrap(),
        )),
    )
    .unwrap()
    .unwrap();

    let wrong = block_on(service.execute(command::UpdateUserPassword {
        user_id: user.id,
        new_password: secret("Updated#456"),
        old_password: secret("Wrong#1234"),
    }))
    .unwrap_err();
    assert!(matches!(
        wrong.as_ref(),
        command::update_user_password::ExecutionError::WrongPassword,
    ));

    let updated = block_on(service.execute(command::UpdateUserPassword {
        user_id: user.id,
        new_password: secret("Updated#456"),
        old_password: secret("Secret#123"),
    }))
    .unwrap();

    assert_ne!(updated.salt, user.salt);
    assert!(updated.verify_password(&Password::new("Updated#456").unwrap()));
    assert!(!updated.verify_password(&Password::new("Secret#123").unwrap()));
}
