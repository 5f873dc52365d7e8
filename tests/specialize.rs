use goreify::{specialize, SpecializeError, SpecializeOptions, TypeMapping, GENERATED_HEADER};

fn gen(src: &str, mapping: &str) -> String {
    let mapping: TypeMapping = mapping.parse().unwrap();
    match specialize(src, "in.go", &mapping, &SpecializeOptions::default()) {
        Ok(out) => out,
        Err(e) => panic!("specialize failed: {e}"),
    }
}

const DAO_WITH_DOCS: &str = "package main

type Type struct {
	ID int64
}

// TypeDAO implements DAO for Type
type TypeDAO struct {}

// zeroType is the zero value of Type
var zeroType Type

// NewTypeDAO returns a new TypeDAO
func NewTypeDAO() *TypeDAO {
	return &TypeDAO{}
}

// Get loads the Type with the given id.
func (dao *TypeDAO) Get(id int64) (*Type, error) {
	var m Type
	m.ID = id
	return &m, nil
}

// Empty is empty.
func (dao *TypeDAO) Empty() {
}
";

#[test]
fn dao_with_docs() {
    assert_eq!(
        gen(DAO_WITH_DOCS, "Type=Concrete"),
        "package main

// ConcreteDAO implements DAO for Concrete
type ConcreteDAO struct {
}

// zeroConcrete is the zero value of Concrete
var zeroConcrete Concrete

// NewConcreteDAO returns a new ConcreteDAO
func NewConcreteDAO() *ConcreteDAO {
	return &ConcreteDAO{}
}

// Get loads the Concrete with the given id.
func (dao *ConcreteDAO) Get(id int64) (*Concrete, error) {
	var m Concrete
	m.ID = id
	return &m, nil
}

// Empty is empty.
func (dao *ConcreteDAO) Empty() {
}
"
    );
}

#[test]
fn dao_without_docs() {
    let src = "package main

type Type struct {
	ID int64
}

type TypeDAO struct {}

var zero Type

func NewTypeDAO() *TypeDAO {
	return &TypeDAO{}
}

func (dao *TypeDAO) Get(id int64) (*Type, error) {
	var m Type
	m.ID = id
	return &m, nil
}

func (dao *TypeDAO) Empty() {
}
";
    assert_eq!(
        gen(src, "Type=Concrete"),
        "package main

type ConcreteDAO struct {
}

var zero Concrete

func NewConcreteDAO() *ConcreteDAO {
	return &ConcreteDAO{}
}
func (dao *ConcreteDAO) Get(id int64) (*Concrete, error) {
	var m Concrete
	m.ID = id
	return &m, nil
}
func (dao *ConcreteDAO) Empty() {
}
"
    );
}

#[test]
fn builtin_concrete_type() {
    let src = "package main

type Number int

const ZeroNumber Number = 0

var SomeNumber Number = 42

func AddNumber(a, b Number) Number {
	return a + b
}

func SubNumber(a, b Number) Number {
	return a - b
}
";
    assert_eq!(
        gen(src, "Number=int64"),
        "package main

const ZeroInt64 int64 = 0

var SomeInt64 int64 = 42

func AddInt64(a, b int64) int64 {
	return a + b
}
func SubInt64(a, b int64) int64 {
	return a - b
}
"
    );
}

#[test]
fn unrelated_functions_are_dropped() {
    let src = "package foo

type Type struct {
	ID int64
}

func FooType(a Type) Type {
	baz(a.ID)
	return barType(a)
}

func barType(a Type) Type {
	a.ID = 42
}

func baz(id int64) {
	id = 0
}
";
    assert_eq!(
        gen(src, "Type=Concrete"),
        "package foo

func FooConcrete(a Concrete) Concrete {
	baz(a.ID)
	return barConcrete(a)
}
func barConcrete(a Concrete) Concrete {
	a.ID = 42
}
"
    );
}

const READER: &str = "package main

import (
	\"io/ioutil\"
	\"io\"
)

type Reader interface {
	io.Reader
}

func ReadAllStringFromReader(r Reader) (string, error) {
	b, err := ioutil.ReadAll(r)
	return string(b), err
}
";

#[test]
fn pointer_into_another_package() {
    assert_eq!(
        gen(READER, "Reader=*os.File"),
        "package main

import (
	\"io/ioutil\"
	\"os\"
)

func ReadAllStringFromFile(r *os.File) (string, error) {
	b, err := ioutil.ReadAll(r)
	return string(b), err
}
"
    );
}

#[test]
fn aliased_package() {
    assert_eq!(
        gen(
            READER,
            "Reader=*(\"github.com/nkovacs/rei/examples/pointer/go-test\")test.TestReader"
        ),
        "package main

import (
	\"io/ioutil\"

	test \"github.com/nkovacs/rei/examples/pointer/go-test\"
)

func ReadAllStringFromTestReader(r *test.TestReader) (string, error) {
	b, err := ioutil.ReadAll(r)
	return string(b), err
}
"
    );
}

#[test]
fn methods_of_the_placeholder_are_dropped() {
    let src = "package main

import (
	\"fmt\"
)

type Type struct {
	ID int64
}

func (t Type) Frobnicate() Type {
	return t
}

func TypeFrobnicator(t *Type) {
	fmt.Println(t.Frobnicate())
}
";
    assert_eq!(
        gen(src, "Type=Concrete"),
        "package main

import \"fmt\"

func ConcreteFrobnicator(t *Concrete) {
	fmt.Println(t.Frobnicate())
}
"
    );
}

#[test]
fn two_placeholders_in_one_name() {
    let src = "package main

type KeyType interface{}
type ValueType interface{}
type KeyTypeValueTypeSliceMap map[KeyType][]ValueType

func (m KeyTypeValueTypeSliceMap) Flatten() []ValueType {
	var ret []ValueType
	for _, v := range m {
		ret = append(ret, v...)
	}
	return ret
}
";
    assert_eq!(
        gen(src, "KeyType=string,ValueType=int"),
        "package main

type StringIntSliceMap map[string][]int

func (m StringIntSliceMap) Flatten() []int {
	var ret []int
	for _, v := range m {
		ret = append(ret, v...)
	}
	return ret
}
"
    );
}

#[test]
fn grouped_declarations_are_split() {
    let src = "package main

type Elem int

// Limits of Elem.
const (
	MinElem Elem = 0
	MaxElem Elem = 9
	other        = 1
)
";
    assert_eq!(
        gen(src, "Elem=uint8"),
        "package main

// Limits of Uint8.
const MinUint8 uint8 = 0

// Limits of Uint8.
const MaxUint8 uint8 = 9
"
    );
}

#[test]
fn header_and_package_options() {
    let mapping: TypeMapping = "Type=Concrete".parse().unwrap();
    let options = SpecializeOptions {
        package_name: Some("concrete".to_owned()),
        header: true,
    };
    let out = specialize(DAO_WITH_DOCS, "in.go", &mapping, &options).unwrap();
    assert!(out.starts_with(&format!("{GENERATED_HEADER}\n\npackage concrete\n\n")), "{out}");
}

#[test]
fn output_is_stable_when_fed_back() {
    let once = gen(READER, "Reader=*os.File");
    // nothing in the output mentions the placeholder any more
    let twice = gen(&once, "Reader=*os.File");
    assert_eq!(twice, "package main\n");
}

#[test]
fn syntax_errors_are_reported_with_position() {
    let mapping: TypeMapping = "T=int".parse().unwrap();
    let options = SpecializeOptions::default();
    let err = specialize("package p\n\nfunc f( {\n}\n", "bad.go", &mapping, &options).unwrap_err();
    assert!(matches!(err, SpecializeError::Parse(_)));
    assert!(err.to_string().starts_with("parsing file failed: bad.go:3:"), "{err}");

    let (open, close) = ("(".repeat(5000), ")".repeat(5000));
    let deep = format!("package p\n\ntype T int\n\nvar x T = {open}1{close}\n");
    let err = specialize(&deep, "deep.go", &mapping, &options).unwrap_err();
    assert!(err.to_string().contains("exceeded max nesting depth"), "{err}");
}

#[test]
fn missing_placeholder_yields_an_empty_package() {
    assert_eq!(gen("package p\n\nfunc f() {}\n", "T=int"), "package p\n");
}

mod cli {
    use std::fs;
    use std::path::PathBuf;
    use std::process::Command;

    const NUMBER: &str = "package main\n\ntype Number int\n\nvar SomeNumber Number = 42\n";

    fn reify() -> Command {
        Command::new(env!("CARGO_BIN_EXE_reify"))
    }

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("reify-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn writes_to_stdout() {
        let dir = scratch("stdout");
        let input = dir.join("number.go");
        fs::write(&input, NUMBER).unwrap();
        let out = reify().arg("--in").arg(&input).arg("Number=int64").output().unwrap();
        assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
        assert_eq!(
            String::from_utf8_lossy(&out.stdout),
            "package main\n\nvar SomeInt64 int64 = 42\n"
        );
    }

    #[test]
    fn output_directory_names_the_package() {
        let dir = scratch("outdir");
        let input = dir.join("number.go");
        fs::write(&input, NUMBER).unwrap();
        let dest = dir.join("ints").join("number.go");
        let status = reify()
            .arg("--in")
            .arg(&input)
            .arg("--out")
            .arg(&dest)
            .arg("Number=int")
            .status()
            .unwrap();
        assert!(status.success());
        assert_eq!(
            fs::read_to_string(&dest).unwrap(),
            "package ints\n\nvar SomeInt int = 42\n"
        );
    }

    #[test]
    fn exit_codes() {
        let dir = scratch("exit");
        let input = dir.join("t.go");
        fs::write(&input, "package p\n\ntype T int\n\nfunc f( {\n}\n").unwrap();

        let code = |args: &[&str]| reify().args(args).output().unwrap().status.code();
        let input = input.to_str().unwrap();
        assert_eq!(code(&["T=int"]), Some(1));
        assert_eq!(code(&["--in", input, "T=1x"]), Some(2));
        assert_eq!(code(&["--in", "/nonexistent/reify/t.go", "T=int"]), Some(4));
        assert_eq!(code(&["--in", input, "T=int"]), Some(5));
    }
}
