/// Produces a doc string linking to a section of the JVM Specification.
macro_rules! see_jvm_spec {
    ($chapter:literal, $section:literal $(, $sub:literal)*) => {
        concat!(
            "See the [JVM Specification §",
            $chapter, ".", $section $(, ".", $sub)*,
            "](https://docs.oracle.com/javase/specs/jvms/se21/html/jvms-",
            $chapter, ".html#jvms-",
            $chapter, ".", $section $(, ".", $sub)*,
            ") for more information."
        )
    };
}

pub(crate) use see_jvm_spec;
