//! Hand-curated identifier -> package table for the ~20 most commonly
//! imported Go standard packages. Not exhaustive; grown as the
//! preprocessor/plugins need to resolve more unqualified calls.
//!
//! A handful of entries are intentionally duplicated across packages
//! (`Open`, `Copy`, `NewReader`, ...) so `lookup_package` exercises the
//! ambiguity path rather than only ever the happy path.
pub static ENTRIES: &[(&str, &str)] = &[
    // os
    ("ReadFile", "os"),
    ("WriteFile", "os"),
    ("Open", "os"),
    ("Create", "os"),
    ("Remove", "os"),
    ("RemoveAll", "os"),
    ("Mkdir", "os"),
    ("MkdirAll", "os"),
    ("Getenv", "os"),
    ("Setenv", "os"),
    ("Exit", "os"),
    ("Stat", "os"),
    ("Rename", "os"),
    ("Getwd", "os"),
    // fmt
    ("Println", "fmt"),
    ("Printf", "fmt"),
    ("Print", "fmt"),
    ("Sprintf", "fmt"),
    ("Sprintln", "fmt"),
    ("Errorf", "fmt"),
    ("Fprintf", "fmt"),
    ("Fprintln", "fmt"),
    ("Scanln", "fmt"),
    ("Sscanf", "fmt"),
    // strings
    ("Split", "strings"),
    ("Join", "strings"),
    ("Contains", "strings"),
    ("HasPrefix", "strings"),
    ("HasSuffix", "strings"),
    ("TrimSpace", "strings"),
    ("ToUpper", "strings"),
    ("ToLower", "strings"),
    ("Replace", "strings"),
    ("ReplaceAll", "strings"),
    ("Index", "strings"),
    ("Fields", "strings"),
    ("NewReader", "strings"),
    ("Builder", "strings"),
    // strconv
    ("Atoi", "strconv"),
    ("Itoa", "strconv"),
    ("ParseInt", "strconv"),
    ("ParseFloat", "strconv"),
    ("ParseBool", "strconv"),
    ("FormatInt", "strconv"),
    ("Quote", "strconv"),
    // io
    ("Copy", "io"),
    ("ReadAll", "io"),
    ("WriteString", "io"),
    ("EOF", "io"),
    ("Pipe", "io"),
    // ioutil (legacy but still widely imported)
    ("TempFile", "ioutil"),
    ("TempDir", "ioutil"),
    // bytes
    ("NewBuffer", "bytes"),
    ("NewBufferString", "bytes"),
    ("Equal", "bytes"),
    ("TrimSpace", "bytes"),
    // errors
    ("New", "errors"),
    ("Is", "errors"),
    ("As", "errors"),
    ("Unwrap", "errors"),
    ("Join", "errors"),
    // sort
    ("Sort", "sort"),
    ("Slice", "sort"),
    ("Strings", "sort"),
    ("Ints", "sort"),
    ("SliceStable", "sort"),
    // time
    ("Now", "time"),
    ("Sleep", "time"),
    ("Since", "time"),
    ("Parse", "time"),
    ("After", "time"),
    ("NewTimer", "time"),
    // context
    ("Background", "context"),
    ("WithCancel", "context"),
    ("WithTimeout", "context"),
    ("WithValue", "context"),
    ("TODO", "context"),
    // sync
    ("WaitGroup", "sync"),
    ("Mutex", "sync"),
    ("Once", "sync"),
    // net
    ("Dial", "net"),
    ("Listen", "net"),
    ("Open", "net"), // intentionally ambiguous with os.Open
    ("LookupHost", "net"),
    ("SplitHostPort", "net"),
    // net/http
    ("Get", "http"),
    ("Post", "http"),
    ("ListenAndServe", "http"),
    ("NewRequest", "http"),
    ("Handle", "http"),
    ("HandleFunc", "http"),
    // encoding/json
    ("Marshal", "json"),
    ("Unmarshal", "json"),
    ("NewEncoder", "json"),
    ("NewDecoder", "json"),
    // path/filepath
    ("Join", "filepath"), // intentionally ambiguous with strings.Join / errors.Join
    ("Base", "filepath"),
    ("Dir", "filepath"),
    ("Ext", "filepath"),
    ("Abs", "filepath"),
    ("Walk", "filepath"),
    // regexp
    ("MustCompile", "regexp"),
    ("Compile", "regexp"),
    ("MatchString", "regexp"),
    // math
    ("Max", "math"),
    ("Min", "math"),
    ("Abs", "math"), // intentionally ambiguous with filepath.Abs
    ("Sqrt", "math"),
    ("Floor", "math"),
    ("Ceil", "math"),
    // bufio
    ("NewScanner", "bufio"),
    ("NewReader", "bufio"), // intentionally ambiguous with strings.NewReader
    ("NewWriter", "bufio"),
    // log
    ("Fatal", "log"),
    ("Fatalf", "log"),
    ("Panic", "log"),
    ("Printf", "log"), // intentionally ambiguous with fmt.Printf
];
